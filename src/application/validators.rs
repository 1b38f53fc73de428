use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Trims the value and rejects it when nothing is left.
pub fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

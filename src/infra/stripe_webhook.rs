use std::collections::HashMap;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::payment_event::{PaymentEvent, PaymentEventKind, PaymentMetadata},
    infra::stripe_payment_adapter::metadata_from_stripe,
};

/// Authenticates raw webhook deliveries and decodes them into [`PaymentEvent`]s.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    secret: SecretString,
    tolerance_secs: i64,
}

impl StripeWebhookVerifier {
    pub fn new(secret: SecretString, tolerance_secs: i64) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    /// `payload` must be the exact bytes received; re-serialized JSON will not verify.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> AppResult<PaymentEvent> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    fn verify_at(&self, payload: &[u8], signature_header: &str, now: i64) -> AppResult<PaymentEvent> {
        // "t=timestamp,v1=signature,..."
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = Some(value),
                "v1" => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| AppError::WebhookAuthentication("Missing timestamp in signature".into()))?;
        if signatures.is_empty() {
            return Err(AppError::WebhookAuthentication("Missing signature".into()));
        }

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AppError::Internal("HMAC error".into()))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        let matched = signatures.iter().any(|sig| {
            hex::decode(sig)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            return Err(AppError::WebhookAuthentication("Invalid signature".into()));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| AppError::WebhookAuthentication("Invalid timestamp".into()))?;
        if (now - ts).abs() > self.tolerance_secs {
            return Err(AppError::WebhookAuthentication("Timestamp outside tolerance".into()));
        }

        decode_event(payload)
    }
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: StripeEventData,
}

#[derive(Debug, Default, Deserialize)]
struct StripeEventData {
    /// Shape depends on the event type; only decoded for handled types.
    #[serde(default)]
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StripeEventObject {
    id: String,
    /// Present on checkout sessions.
    payment_status: Option<String>,
    /// Present on payment intents.
    status: Option<String>,
    customer_email: Option<String>,
    /// Stripe may send `null`.
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}

fn decode_event(payload: &[u8]) -> AppResult<PaymentEvent> {
    let event: StripeEvent = serde_json::from_slice(payload).map_err(|e| {
        AppError::WebhookAuthentication(format!("Malformed event payload: {}", e))
    })?;
    let kind = PaymentEventKind::from_event_type(&event.event_type);

    // Unhandled types are acknowledged as-is; their objects may lack an id.
    if let PaymentEventKind::Other(_) = kind {
        return Ok(PaymentEvent {
            id: event.id,
            kind,
            object_id: event
                .data
                .object
                .get("id")
                .and_then(|id| id.as_str())
                .unwrap_or_default()
                .to_string(),
            status: None,
            metadata: PaymentMetadata::default(),
        });
    }

    let object: StripeEventObject = serde_json::from_value(event.data.object).map_err(|e| {
        AppError::WebhookAuthentication(format!(
            "Malformed {} object: {}",
            event.event_type, e
        ))
    })?;

    Ok(PaymentEvent {
        id: event.id,
        kind,
        metadata: metadata_from_stripe(
            &object.metadata.unwrap_or_default(),
            object.customer_email.as_deref(),
        ),
        status: object.payment_status.or(object.status),
        object_id: object.id,
    })
}

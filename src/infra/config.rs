use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::application::ports::payment_provider::PremiumPlan;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub access_token_ttl: Duration,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Frontend base URL; checkout success/cancel redirects point here.
    pub client_url: Url,
    pub stripe_secret_key: SecretString,
    pub stripe_webhook_secret: SecretString,
    /// Maximum age of a webhook signature timestamp.
    pub stripe_webhook_tolerance_secs: i64,
    pub premium_plan: PremiumPlan,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 1_800);

        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:5173"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:5000".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 5);

        let client_url: Url = get_env("CLIENT_URL");
        let stripe_secret_key: SecretString =
            SecretString::new(get_env::<String>("STRIPE_SECRET_KEY").into());
        let stripe_webhook_secret: SecretString =
            SecretString::new(get_env::<String>("STRIPE_WEBHOOK_SECRET").into());
        let stripe_webhook_tolerance_secs: i64 = get_env_default("STRIPE_WEBHOOK_TOLERANCE_SECS", 300);

        let premium_plan = PremiumPlan {
            product_name: get_env_default(
                "PREMIUM_PRODUCT_NAME",
                "Digital Life Lessons - Premium Plan".to_string(),
            ),
            description: get_env_default(
                "PREMIUM_PRODUCT_DESCRIPTION",
                "Lifetime access to premium features including unlimited lessons, ad-free experience, and priority support".to_string(),
            ),
            image_url: std::env::var("PREMIUM_PRODUCT_IMAGE_URL").ok(),
            unit_amount: get_env_default("PREMIUM_PRICE_MINOR_UNITS", 150_000),
            currency: get_env_default("PREMIUM_CURRENCY", "bdt".to_string()).to_lowercase(),
        };

        Self {
            jwt_secret,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            cors_origin,
            bind_addr,
            database_url,
            database_max_connections,
            client_url,
            stripe_secret_key,
            stripe_webhook_secret,
            stripe_webhook_tolerance_secs,
            premium_plan,
        }
    }
}

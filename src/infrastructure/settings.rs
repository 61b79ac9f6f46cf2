//! Webhook and delivery settings read from the environment

use di::inject;
use di::injectable;
use std::env;

pub const DEFAULT_VERIFY_TOKEN: &str = "your_verify_token_here";
pub const DEFAULT_ACCESS_TOKEN: &str = "your_whatsapp_token_here";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Secret the platform echoes back in `hub.verify_token`.
    pub verify_token: String,
    pub access_token: String,
    pub bind_address: String,
}

#[injectable]
impl WebhookSettings {
    #[inject]
    pub fn create() -> WebhookSettings {
        dotenvy::dotenv().ok();

        WebhookSettings {
            verify_token: env::var("WHATSAPP_VERIFY_TOKEN")
                .unwrap_or_else(|_| DEFAULT_VERIFY_TOKEN.to_owned()),
            access_token: env::var("WHATSAPP_TOKEN")
                .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN.to_owned()),
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_owned()),
        }
    }

    /// Whether an outbound token was configured instead of the placeholder.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty() && self.access_token != DEFAULT_ACCESS_TOKEN
    }
}

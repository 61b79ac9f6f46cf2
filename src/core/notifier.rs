//! Outbound delivery stand-in

use crate::core::traits::{DeliveryError, Notifier};
use crate::infrastructure::settings::WebhookSettings;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, info};

/// Logs every response instead of calling the platform's send API.
pub struct LogNotifier {
    settings: Ref<WebhookSettings>,
}

#[injectable(Notifier)]
impl LogNotifier {
    #[inject]
    pub fn create(settings: Ref<WebhookSettings>) -> LogNotifier {
        LogNotifier { settings }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, text: &str) -> Result<(), DeliveryError> {
        if to.trim().is_empty() {
            return Err(DeliveryError::InvalidDestination(to.to_owned()));
        }

        if !self.settings.has_access_token() {
            debug!("no WHATSAPP_TOKEN configured, delivery stays local");
        }

        info!("Bot response to {to}: {text}");
        Ok(())
    }
}

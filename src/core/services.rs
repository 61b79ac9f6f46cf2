//! Implementations for the service the app needs.
//!

use crate::core::traits::{InboundService, InboundUnit, Notifier};
use crate::core::{commands, responses, tracker};
use crate::infrastructure::entities::{Message, MessageStatus, MessageStatusUpdate, NewMessage};
use crate::infrastructure::traits::BotRepository;
use anyhow::anyhow;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, error, warn};
use std::time::Instant;

pub struct BotMessageService {
    repo: Ref<dyn BotRepository>,
    notifier: Ref<dyn Notifier>,
}

#[injectable(InboundService)]
impl BotMessageService {
    #[inject]
    pub fn create(repo: Ref<dyn BotRepository>, notifier: Ref<dyn Notifier>) -> BotMessageService {
        BotMessageService { repo, notifier }
    }

    async fn respond(&self, unit: &InboundUnit) -> anyhow::Result<Message> {
        let body = unit.body.as_deref();
        let is_command = body.is_some_and(commands::is_command);
        let command_name = body.and_then(commands::command_name);

        let started = Instant::now();

        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "timestamp".to_owned(),
            serde_json::Value::String(unit.external_timestamp.clone()),
        );

        let message = self
            .repo
            .create_message(NewMessage {
                whatsapp_message_id: unit.external_id.clone(),
                from_number: unit.from.clone(),
                to_number: unit.to.clone(),
                message_text: unit.body.clone(),
                message_type: unit.kind.clone(),
                is_command,
                command_name: command_name.clone(),
                metadata,
            })
            .await?;

        // a bare `/` stays a command on the record but is answered like plain text
        let command = command_name.as_deref().filter(|name| !name.is_empty());
        tracker::touch(&*self.repo, &unit.from, command).await?;

        let response = match command {
            Some(command) => responses::resolve_command(&*self.repo, command).await,
            None => responses::resolve_default(&*self.repo).await,
        };

        let response_time = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.repo
            .update_message_status(
                message.id,
                MessageStatusUpdate {
                    status: MessageStatus::Responded,
                    response_time: Some(response_time),
                    bot_response: Some(response),
                },
            )
            .await
            .ok_or_else(|| anyhow!("message {} vanished before it was answered", message.id))
    }
}

#[async_trait]
impl InboundService for BotMessageService {
    async fn process(&self, unit: InboundUnit) -> Option<Message> {
        debug!("processing message {} from {}", unit.external_id, unit.from);

        let message = match self.respond(&unit).await {
            Ok(message) => message,
            Err(e) => {
                error!("dropping message {}: {e:#}", unit.external_id);
                return None;
            }
        };

        if let Some(response) = &message.bot_response {
            if let Err(e) = self.notifier.send(&message.from_number, response).await {
                warn!("failed to deliver response to {}: {e}", message.from_number);
            }
        }

        Some(message)
    }
}

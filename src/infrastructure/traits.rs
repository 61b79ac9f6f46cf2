//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message `{0}` has already been stored")]
    DuplicateMessage(String),

    #[error("conversation for `{0}` already exists")]
    ConversationExists(String),
}

/// Owner of all bot state.
///
/// Every read hands out a copy of the stored record. Lookups on unknown keys return `None`;
/// they are never reported as errors.
#[async_trait]
pub trait BotRepository: Send + Sync {
    /// Stores a new message, assigning its id and receipt timestamp.
    ///
    /// Returns `Err` if a message with the same external id was already stored.
    async fn create_message(
        &self,
        message: entities::NewMessage,
    ) -> Result<entities::Message, StoreError>;

    /// Messages newest first, windowed by `offset` and `limit`.
    async fn list_messages(&self, limit: usize, offset: usize) -> Vec<entities::Message>;

    /// All messages sent by `phone_number`, oldest first.
    async fn list_conversation_messages(&self, phone_number: &str) -> Vec<entities::Message>;

    /// Snapshot of every stored message in ingestion order.
    async fn all_messages(&self) -> Vec<entities::Message>;

    async fn update_message_status(
        &self,
        id: Uuid,
        update: entities::MessageStatusUpdate,
    ) -> Option<entities::Message>;

    async fn get_conversation(&self, phone_number: &str) -> Option<entities::Conversation>;

    /// Creates a conversation, stamping the current time as its last activity.
    ///
    /// Returns `Err` if the phone number already has a conversation.
    async fn create_conversation(
        &self,
        conversation: entities::NewConversation,
    ) -> Result<entities::Conversation, StoreError>;

    /// Merges `update` into the stored conversation and refreshes its last activity.
    async fn update_conversation(
        &self,
        phone_number: &str,
        update: entities::ConversationUpdate,
    ) -> Option<entities::Conversation>;

    /// Active conversations, most recently active first.
    async fn list_active_conversations(&self) -> Vec<entities::Conversation>;

    /// Snapshot of every stored conversation.
    async fn all_conversations(&self) -> Vec<entities::Conversation>;

    /// Templates, newest first.
    async fn list_templates(&self) -> Vec<entities::Template>;

    async fn get_template(&self, id: Uuid) -> Option<entities::Template>;

    async fn create_template(&self, template: entities::NewTemplate) -> entities::Template;

    async fn update_template(
        &self,
        id: Uuid,
        update: entities::TemplateUpdate,
    ) -> Option<entities::Template>;

    async fn increment_template_usage(&self, id: Uuid) -> Option<entities::Template>;

    /// Bot configuration entries in creation order.
    async fn list_bot_config(&self) -> Vec<entities::BotConfig>;

    async fn get_bot_config(&self, key: &str) -> Option<entities::BotConfig>;

    /// Creates or replaces the entry stored under `config.key`.
    async fn set_bot_config(&self, config: entities::NewBotConfig) -> entities::BotConfig;

    async fn update_bot_config(
        &self,
        key: &str,
        update: entities::BotConfigUpdate,
    ) -> Option<entities::BotConfig>;

    async fn create_webhook_log(&self, log: entities::NewWebhookLog) -> entities::WebhookLog;

    /// Webhook logs, newest first, at most `limit` of them.
    async fn list_webhook_logs(&self, limit: usize) -> Vec<entities::WebhookLog>;

    async fn get_analytics(&self, date: &str) -> Option<entities::Analytics>;

    async fn upsert_analytics(&self, analytics: entities::NewAnalytics) -> entities::Analytics;

    /// Rollups with `start <= date <= end`, ascending by date.
    async fn list_analytics_range(&self, start: &str, end: &str) -> Vec<entities::Analytics>;
}

//! Stored entities and the field sets used to create and update them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Received,
    Pending,
    Responded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub whatsapp_message_id: String,
    pub from_number: String,
    pub to_number: String,
    pub message_text: Option<String>,
    pub message_type: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
    /// Milliseconds between ingestion and response, set once the message is responded.
    pub response_time: Option<u64>,
    pub is_command: bool,
    pub command_name: Option<String>,
    pub bot_response: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub whatsapp_message_id: String,
    pub from_number: String,
    pub to_number: String,
    pub message_text: Option<String>,
    pub message_type: String,
    pub is_command: bool,
    pub command_name: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Replaces status, latency and response of a message in one step.
#[derive(Debug, Clone)]
pub struct MessageStatusUpdate {
    pub status: MessageStatus,
    pub response_time: Option<u64>,
    pub bot_response: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Active,
    Paused,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub phone_number: String,
    pub display_name: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub message_count: u32,
    pub is_active: bool,
    pub last_command: Option<String>,
    pub conversation_state: ConversationState,
}

#[derive(Debug, Clone)]
pub struct NewConversation {
    pub phone_number: String,
    pub display_name: Option<String>,
    pub message_count: u32,
    pub is_active: bool,
    pub last_command: Option<String>,
    pub conversation_state: ConversationState,
}

/// How an update changes the message counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountChange {
    Set(u32),
    Increment(u32),
}

/// Field-by-field merge: `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ConversationUpdate {
    pub display_name: Option<String>,
    pub message_count: Option<CountChange>,
    pub is_active: Option<bool>,
    pub last_command: Option<String>,
    pub conversation_state: Option<ConversationState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Marketing,
    Utility,
    Authentication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub category: TemplateCategory,
    pub language: String,
    pub status: TemplateStatus,
    pub components: serde_json::Value,
    pub usage_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub category: TemplateCategory,
    pub language: String,
    pub status: TemplateStatus,
    pub components: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub category: Option<TemplateCategory>,
    pub language: Option<String>,
    pub status: Option<TemplateStatus>,
    pub components: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    pub id: Uuid,
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBotConfig {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BotConfigUpdate {
    pub value: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookLog {
    pub id: Uuid,
    pub webhook_url: String,
    pub method: String,
    pub response_status: Option<u16>,
    pub response_time: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub is_successful: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWebhookLog {
    pub webhook_url: String,
    pub method: String,
    pub response_status: Option<u16>,
    pub response_time: Option<u64>,
    pub is_successful: bool,
    pub error_message: Option<String>,
}

/// Daily rollup keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub id: Uuid,
    pub date: String,
    pub messages_received: u32,
    pub messages_responded: u32,
    pub active_users: u32,
    pub avg_response_time: u64,
    pub command_usage: BTreeMap<String, u32>,
}

#[derive(Debug, Clone)]
pub struct NewAnalytics {
    pub date: String,
    pub messages_received: u32,
    pub messages_responded: u32,
    pub active_users: u32,
    pub avg_response_time: u64,
    pub command_usage: BTreeMap<String, u32>,
}

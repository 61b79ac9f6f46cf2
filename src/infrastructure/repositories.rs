//! In-memory repository

use crate::infrastructure::entities::{
    Analytics, BotConfig, BotConfigUpdate, Conversation, ConversationUpdate, CountChange,
    Message, MessageStatus, MessageStatusUpdate, NewAnalytics, NewBotConfig, NewConversation, NewMessage,
    NewTemplate, NewWebhookLog, Template, TemplateUpdate, WebhookLog,
};
use crate::infrastructure::traits::{BotRepository, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use di::{inject, injectable};
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Configuration every fresh store starts with: key, value, description.
pub const DEFAULT_BOT_CONFIG: [(&str, &str, &str); 5] = [
    (
        "welcome_message",
        "Hello! Welcome to our WhatsApp bot. Type /help to see available commands.",
        "Welcome message for new users",
    ),
    (
        "help_message",
        "Available commands:\n/help - Show this help message\n/info - Company information\n/contact - Contact details\n/order - Check order status",
        "Help command response",
    ),
    (
        "info_message",
        "We are a leading company providing excellent services. Visit our website for more information.",
        "Company information",
    ),
    (
        "contact_message",
        "Contact us:\nPhone: +1 (555) 123-4567\nEmail: support@company.com\nWebsite: https://company.com",
        "Contact information",
    ),
    (
        "default_response",
        "I'm sorry, I didn't understand that. Type /help to see available commands.",
        "Default response for unknown messages",
    ),
];

struct Row<T> {
    seq: u64,
    value: T,
}

/// One keyed table. Every mutation of a row happens under that row's shard lock, so two
/// writers to the same key never interleave.
struct Table<K: Eq + Hash, V> {
    rows: DashMap<K, Row<V>>,
}

impl<K: Eq + Hash, V: Clone> Table<K, V> {
    fn new() -> Self {
        Table {
            rows: DashMap::new(),
        }
    }

    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.rows.get(key).map(|row| row.value.clone())
    }

    fn insert(&self, key: K, seq: u64, value: V) {
        self.rows.insert(key, Row { seq, value });
    }

    fn insert_new(&self, key: K, seq: u64, build: impl FnOnce() -> V) -> Option<V> {
        match self.rows.entry(key) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let value = build();
                slot.insert(Row {
                    seq,
                    value: value.clone(),
                });
                Some(value)
            }
        }
    }

    fn update<Q>(&self, key: &Q, apply: impl FnOnce(&mut V)) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut row = self.rows.get_mut(key)?;
        apply(&mut row.value);
        Some(row.value.clone())
    }

    /// Copies every row out, in insertion order.
    fn snapshot(&self) -> Vec<V> {
        let mut rows: Vec<(u64, V)> = self
            .rows
            .iter()
            .map(|row| (row.seq, row.value.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, value)| value).collect()
    }
}

pub struct InMemoryRepository {
    sequence: AtomicU64,
    messages: Table<Uuid, Message>,
    external_ids: DashMap<String, Uuid>,
    conversations: Table<String, Conversation>,
    templates: Table<Uuid, Template>,
    bot_config: Table<String, BotConfig>,
    webhook_logs: Table<Uuid, WebhookLog>,
    analytics: Table<String, Analytics>,
}

#[injectable(BotRepository)]
impl InMemoryRepository {
    /// Creates a store seeded with [`DEFAULT_BOT_CONFIG`].
    #[inject]
    pub fn create() -> InMemoryRepository {
        let repository = InMemoryRepository {
            sequence: AtomicU64::new(0),
            messages: Table::new(),
            external_ids: DashMap::new(),
            conversations: Table::new(),
            templates: Table::new(),
            bot_config: Table::new(),
            webhook_logs: Table::new(),
            analytics: Table::new(),
        };

        for (key, value, description) in DEFAULT_BOT_CONFIG {
            repository.put_bot_config(NewBotConfig {
                key: key.to_owned(),
                value: value.to_owned(),
                description: Some(description.to_owned()),
                is_active: true,
            });
        }

        repository
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    fn put_bot_config(&self, config: NewBotConfig) -> BotConfig {
        let entry = BotConfig {
            id: Uuid::new_v4(),
            key: config.key,
            value: config.value,
            description: config.description,
            is_active: config.is_active,
            updated_at: Utc::now(),
        };

        match self.bot_config.rows.entry(entry.key.clone()) {
            Entry::Occupied(mut slot) => slot.get_mut().value = entry.clone(),
            Entry::Vacant(slot) => {
                slot.insert(Row {
                    seq: self.next_seq(),
                    value: entry.clone(),
                });
            }
        }

        entry
    }
}

/// Newest first; rows with equal timestamps keep newest-inserted first.
fn newest_first(mut messages: Vec<Message>) -> Vec<Message> {
    messages.reverse();
    messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    messages
}

#[async_trait]
impl BotRepository for InMemoryRepository {
    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let id = match self.external_ids.entry(message.whatsapp_message_id.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::DuplicateMessage(message.whatsapp_message_id));
            }
            Entry::Vacant(slot) => *slot.insert(Uuid::new_v4()),
        };

        let stored = Message {
            id,
            whatsapp_message_id: message.whatsapp_message_id,
            from_number: message.from_number,
            to_number: message.to_number,
            message_text: message.message_text,
            message_type: message.message_type,
            timestamp: Utc::now(),
            status: MessageStatus::Received,
            response_time: None,
            is_command: message.is_command,
            command_name: message.command_name,
            bot_response: None,
            metadata: message.metadata,
        };
        self.messages.insert(id, self.next_seq(), stored.clone());

        Ok(stored)
    }

    async fn list_messages(&self, limit: usize, offset: usize) -> Vec<Message> {
        newest_first(self.messages.snapshot())
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect()
    }

    async fn list_conversation_messages(&self, phone_number: &str) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .messages
            .snapshot()
            .into_iter()
            .filter(|message| message.from_number == phone_number)
            .collect();
        messages.sort_by_key(|message| message.timestamp);
        messages
    }

    async fn all_messages(&self) -> Vec<Message> {
        self.messages.snapshot()
    }

    async fn update_message_status(
        &self,
        id: Uuid,
        update: MessageStatusUpdate,
    ) -> Option<Message> {
        self.messages.update(&id, |message| {
            message.status = update.status;
            message.response_time = update.response_time;
            message.bot_response = update.bot_response;
        })
    }

    async fn get_conversation(&self, phone_number: &str) -> Option<Conversation> {
        self.conversations.get(phone_number)
    }

    async fn create_conversation(
        &self,
        conversation: NewConversation,
    ) -> Result<Conversation, StoreError> {
        let phone_number = conversation.phone_number.clone();
        self.conversations
            .insert_new(phone_number.clone(), self.next_seq(), || Conversation {
                id: Uuid::new_v4(),
                phone_number: conversation.phone_number,
                display_name: conversation.display_name,
                last_message_at: Utc::now(),
                message_count: conversation.message_count,
                is_active: conversation.is_active,
                last_command: conversation.last_command,
                conversation_state: conversation.conversation_state,
            })
            .ok_or(StoreError::ConversationExists(phone_number))
    }

    async fn update_conversation(
        &self,
        phone_number: &str,
        update: ConversationUpdate,
    ) -> Option<Conversation> {
        self.conversations.update(phone_number, |conversation| {
            if let Some(display_name) = update.display_name {
                conversation.display_name = Some(display_name);
            }
            match update.message_count {
                Some(CountChange::Set(count)) => conversation.message_count = count,
                Some(CountChange::Increment(by)) => {
                    conversation.message_count = conversation.message_count.saturating_add(by)
                }
                None => {}
            }
            if let Some(is_active) = update.is_active {
                conversation.is_active = is_active;
            }
            if let Some(last_command) = update.last_command {
                conversation.last_command = Some(last_command);
            }
            if let Some(state) = update.conversation_state {
                conversation.conversation_state = state;
            }
            conversation.last_message_at = Utc::now();
        })
    }

    async fn list_active_conversations(&self) -> Vec<Conversation> {
        let mut conversations: Vec<Conversation> = self
            .conversations
            .snapshot()
            .into_iter()
            .filter(|conversation| conversation.is_active)
            .collect();
        conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        conversations
    }

    async fn all_conversations(&self) -> Vec<Conversation> {
        self.conversations.snapshot()
    }

    async fn list_templates(&self) -> Vec<Template> {
        let mut templates = self.templates.snapshot();
        templates.reverse();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        templates
    }

    async fn get_template(&self, id: Uuid) -> Option<Template> {
        self.templates.get(&id)
    }

    async fn create_template(&self, template: NewTemplate) -> Template {
        let now = Utc::now();
        let stored = Template {
            id: Uuid::new_v4(),
            name: template.name,
            category: template.category,
            language: template.language,
            status: template.status,
            components: template.components,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.templates
            .insert(stored.id, self.next_seq(), stored.clone());
        stored
    }

    async fn update_template(&self, id: Uuid, update: TemplateUpdate) -> Option<Template> {
        self.templates.update(&id, |template| {
            if let Some(name) = update.name {
                template.name = name;
            }
            if let Some(category) = update.category {
                template.category = category;
            }
            if let Some(language) = update.language {
                template.language = language;
            }
            if let Some(status) = update.status {
                template.status = status;
            }
            if let Some(components) = update.components {
                template.components = components;
            }
            template.updated_at = Utc::now();
        })
    }

    async fn increment_template_usage(&self, id: Uuid) -> Option<Template> {
        self.templates.update(&id, |template| {
            template.usage_count = template.usage_count.saturating_add(1);
        })
    }

    async fn list_bot_config(&self) -> Vec<BotConfig> {
        self.bot_config.snapshot()
    }

    async fn get_bot_config(&self, key: &str) -> Option<BotConfig> {
        self.bot_config.get(key)
    }

    async fn set_bot_config(&self, config: NewBotConfig) -> BotConfig {
        self.put_bot_config(config)
    }

    async fn update_bot_config(&self, key: &str, update: BotConfigUpdate) -> Option<BotConfig> {
        self.bot_config.update(key, |config| {
            if let Some(value) = update.value {
                config.value = value;
            }
            if let Some(description) = update.description {
                config.description = Some(description);
            }
            if let Some(is_active) = update.is_active {
                config.is_active = is_active;
            }
            config.updated_at = Utc::now();
        })
    }

    async fn create_webhook_log(&self, log: NewWebhookLog) -> WebhookLog {
        let stored = WebhookLog {
            id: Uuid::new_v4(),
            webhook_url: log.webhook_url,
            method: log.method,
            response_status: log.response_status,
            response_time: log.response_time,
            timestamp: Utc::now(),
            is_successful: log.is_successful,
            error_message: log.error_message,
        };
        self.webhook_logs
            .insert(stored.id, self.next_seq(), stored.clone());
        stored
    }

    async fn list_webhook_logs(&self, limit: usize) -> Vec<WebhookLog> {
        let mut logs = self.webhook_logs.snapshot();
        logs.reverse();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        logs.truncate(limit);
        logs
    }

    async fn get_analytics(&self, date: &str) -> Option<Analytics> {
        self.analytics.get(date)
    }

    async fn upsert_analytics(&self, analytics: NewAnalytics) -> Analytics {
        let seq = self.next_seq();
        match self.analytics.rows.entry(analytics.date.clone()) {
            Entry::Occupied(mut slot) => {
                let stored = &mut slot.get_mut().value;
                stored.messages_received = analytics.messages_received;
                stored.messages_responded = analytics.messages_responded;
                stored.active_users = analytics.active_users;
                stored.avg_response_time = analytics.avg_response_time;
                stored.command_usage = analytics.command_usage;
                stored.clone()
            }
            Entry::Vacant(slot) => {
                let stored = Analytics {
                    id: Uuid::new_v4(),
                    date: analytics.date,
                    messages_received: analytics.messages_received,
                    messages_responded: analytics.messages_responded,
                    active_users: analytics.active_users,
                    avg_response_time: analytics.avg_response_time,
                    command_usage: analytics.command_usage,
                };
                slot.insert(Row {
                    seq,
                    value: stored.clone(),
                });
                stored
            }
        }
    }

    async fn list_analytics_range(&self, start: &str, end: &str) -> Vec<Analytics> {
        let mut rollups: Vec<Analytics> = self
            .analytics
            .snapshot()
            .into_iter()
            .filter(|rollup| rollup.date.as_str() >= start && rollup.date.as_str() <= end)
            .collect();
        rollups.sort_by(|a, b| a.date.cmp(&b.date));
        rollups
    }
}

//! WhatsApp bot webhook server - Library exports for testing
//!

pub mod api;
pub mod core;
pub mod infrastructure;

use crate::core::notifier::LogNotifier;
use crate::core::services::BotMessageService;
use crate::core::stats::StatsService;
use crate::infrastructure::repositories::InMemoryRepository;
use crate::infrastructure::settings::WebhookSettings;
use di::{Injectable, ServiceCollection};

/// The services the HTTP API resolves per request.
///
/// State lives in the singleton repository, so every scope sees the same store.
pub fn services() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services
        .add(WebhookSettings::singleton())
        .add(InMemoryRepository::singleton())
        .add(LogNotifier::singleton())
        .add(BotMessageService::scoped())
        .add(StatsService::scoped());
    services
}

//! Dashboard metrics and daily rollups

use crate::core::traits::DashboardService;
use crate::infrastructure::entities::{
    Analytics, Conversation, Message, MessageStatus, NewAnalytics,
};
use crate::infrastructure::traits::BotRepository;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use di::{Ref, inject, injectable};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

const RECENT_MESSAGES: usize = 10;
const TOP_COMMANDS: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub messages_today: usize,
    pub active_users: usize,
    /// Percentage of today's messages that were answered, one decimal.
    pub response_rate: f64,
    /// Mean latency of today's answers in milliseconds.
    pub avg_response_time: u64,
    pub recent_messages: Vec<Message>,
    pub command_stats: Vec<CommandStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandStat {
    pub name: String,
    pub usage: u32,
    pub description: String,
}

pub fn command_description(command: &str) -> &'static str {
    match command {
        "help" => "Show available commands",
        "info" => "Company information",
        "contact" => "Contact information",
        "order" => "Order status check",
        _ => "Custom command",
    }
}

fn mean_latency(messages: &[&Message]) -> u64 {
    let latencies: Vec<u64> = messages
        .iter()
        .filter(|message| message.status == MessageStatus::Responded)
        .filter_map(|message| message.response_time)
        .collect();

    if latencies.is_empty() {
        return 0;
    }

    let total: u64 = latencies.iter().sum();
    (total as f64 / latencies.len() as f64).round() as u64
}

/// Command usage grouped in order of first appearance. Nameless commands are not counted.
fn command_usage(messages: &[&Message]) -> Vec<(String, u32)> {
    let mut usage: Vec<(String, u32)> = Vec::new();

    for name in messages
        .iter()
        .filter(|message| message.is_command)
        .filter_map(|message| message.command_name.as_ref())
        .filter(|name| !name.is_empty())
    {
        match usage.iter_mut().find(|(seen, _)| seen == name) {
            Some((_, count)) => *count += 1,
            None => usage.push((name.clone(), 1)),
        }
    }

    usage
}

/// Computes dashboard metrics from store snapshots.
///
/// `messages` must be in ingestion order. "Today" is `now`'s UTC calendar day, while active
/// users are counted over the trailing 24 hours.
pub fn compute_dashboard(
    messages: &[Message],
    conversations: &[Conversation],
    now: DateTime<Utc>,
) -> DashboardStats {
    let today = now.date_naive();
    let todays: Vec<&Message> = messages
        .iter()
        .filter(|message| message.timestamp.date_naive() == today)
        .collect();

    let responded = todays
        .iter()
        .filter(|message| message.status == MessageStatus::Responded)
        .count();
    let response_rate = if todays.is_empty() {
        0.0
    } else {
        (responded as f64 / todays.len() as f64 * 1000.0).round() / 10.0
    };

    let window_start = now - Duration::hours(24);
    let active_users = conversations
        .iter()
        .filter(|conversation| conversation.is_active && conversation.last_message_at > window_start)
        .map(|conversation| conversation.phone_number.as_str())
        .collect::<HashSet<_>>()
        .len();

    let mut recent_messages: Vec<Message> = messages.iter().rev().cloned().collect();
    recent_messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent_messages.truncate(RECENT_MESSAGES);

    let command_stats = command_usage(&todays)
        .into_iter()
        .take(TOP_COMMANDS)
        .map(|(name, usage)| CommandStat {
            description: command_description(&name).to_owned(),
            name: format!("/{name}"),
            usage,
        })
        .collect();

    DashboardStats {
        messages_today: todays.len(),
        active_users,
        response_rate,
        avg_response_time: mean_latency(&todays),
        recent_messages,
        command_stats,
    }
}

/// Rollup of every message received on `date` (UTC).
pub fn compute_rollup(messages: &[Message], date: NaiveDate) -> NewAnalytics {
    let on_date: Vec<&Message> = messages
        .iter()
        .filter(|message| message.timestamp.date_naive() == date)
        .collect();

    let responded = on_date
        .iter()
        .filter(|message| message.status == MessageStatus::Responded)
        .count();
    let senders = on_date
        .iter()
        .map(|message| message.from_number.as_str())
        .collect::<HashSet<_>>()
        .len();

    NewAnalytics {
        date: date.format("%Y-%m-%d").to_string(),
        messages_received: on_date.len() as u32,
        messages_responded: responded as u32,
        active_users: senders as u32,
        avg_response_time: mean_latency(&on_date),
        command_usage: command_usage(&on_date)
            .into_iter()
            .collect::<BTreeMap<_, _>>(),
    }
}

pub struct StatsService {
    repo: Ref<dyn BotRepository>,
}

#[injectable(DashboardService)]
impl StatsService {
    #[inject]
    pub fn create(repo: Ref<dyn BotRepository>) -> StatsService {
        StatsService { repo }
    }
}

#[async_trait]
impl DashboardService for StatsService {
    async fn dashboard_stats(&self) -> DashboardStats {
        let messages = self.repo.all_messages().await;
        let conversations = self.repo.all_conversations().await;
        compute_dashboard(&messages, &conversations, Utc::now())
    }

    async fn rollup(&self, date: NaiveDate) -> Analytics {
        let messages = self.repo.all_messages().await;
        self.repo
            .upsert_analytics(compute_rollup(&messages, date))
            .await
    }
}

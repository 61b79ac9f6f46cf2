//! DI "Interfaces"

use crate::core::stats::DashboardStats;
use crate::infrastructure::entities;
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// One inbound message extracted from a webhook delivery.
#[derive(Debug, Clone)]
pub struct InboundUnit {
    pub external_id: String,
    pub from: String,
    pub to: String,
    pub body: Option<String>,
    pub kind: String,
    /// Timestamp as reported by the platform, kept verbatim in the message metadata.
    pub external_timestamp: String,
}

#[async_trait]
pub trait InboundService: Send + Sync {
    /// Runs one inbound unit through the bot: stores it, updates the sender's conversation,
    /// resolves and records the response, then hands the response to the notifier.
    ///
    /// Failures are logged and swallowed; `None` means the unit was dropped.
    async fn process(&self, unit: InboundUnit) -> Option<entities::Message>;
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid destination `{0}`")]
    InvalidDestination(String),

    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// Outbound channel back to the messaging platform.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, text: &str) -> Result<(), DeliveryError>;
}

#[async_trait]
pub trait DashboardService: Send + Sync {
    /// Dashboard metrics as of now.
    async fn dashboard_stats(&self) -> DashboardStats;

    /// Recomputes the rollup for `date` and stores it.
    async fn rollup(&self, date: NaiveDate) -> entities::Analytics;
}

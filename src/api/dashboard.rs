//! Dashboard, webhook log and analytics endpoints

use crate::api::ApiError;
use crate::api::dashboard::schemas::{AnalyticsRange, LogQuery, RollupQuery};
use crate::core::stats::DashboardStats;
use crate::core::traits::DashboardService;
use crate::infrastructure::entities::{Analytics, WebhookLog};
use crate::infrastructure::traits::BotRepository;
use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use di_axum::Inject;

const DEFAULT_LOG_LIMIT: usize = 100;

pub fn router() -> Router {
    Router::new()
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/webhooks/logs", get(webhook_logs))
        .route("/analytics", get(analytics_range))
        .route("/analytics/rollup", post(rollup))
}

async fn dashboard_stats(Inject(stats): Inject<dyn DashboardService>) -> Json<DashboardStats> {
    Json(stats.dashboard_stats().await)
}

async fn webhook_logs(
    Inject(repo): Inject<dyn BotRepository>,
    Query(query): Query<LogQuery>,
) -> Json<Vec<WebhookLog>> {
    let limit = query
        .limit
        .and_then(|limit| limit.parse::<usize>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LOG_LIMIT);

    Json(repo.list_webhook_logs(limit).await)
}

async fn analytics_range(
    Inject(repo): Inject<dyn BotRepository>,
    query: Result<Query<AnalyticsRange>, QueryRejection>,
) -> Result<Json<Vec<Analytics>>, ApiError> {
    let Query(range) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let start = range.start.format("%Y-%m-%d").to_string();
    let end = range.end.format("%Y-%m-%d").to_string();

    Ok(Json(repo.list_analytics_range(&start, &end).await))
}

async fn rollup(
    Inject(stats): Inject<dyn DashboardService>,
    query: Result<Query<RollupQuery>, QueryRejection>,
) -> Result<Json<Analytics>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    Ok(Json(stats.rollup(date).await))
}

pub mod schemas {
    use chrono::NaiveDate;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Default)]
    pub struct LogQuery {
        pub limit: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct AnalyticsRange {
        pub start: NaiveDate,
        pub end: NaiveDate,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct RollupQuery {
        pub date: Option<NaiveDate>,
    }
}

//! Bot configuration and manual test endpoints

use crate::api::ApiError;
use crate::api::bot::schemas::{StatusReply, TestMessage, UpdateBotConfig};
use crate::core::traits::{InboundService, InboundUnit};
use crate::infrastructure::entities::{BotConfig, BotConfigUpdate};
use crate::infrastructure::traits::BotRepository;
use axum::extract::Path;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use di_axum::Inject;
use uuid::Uuid;

pub const TEST_RECIPIENT: &str = "test_bot";

pub fn router() -> Router {
    Router::new()
        .route("/config", get(list_config))
        .route("/config/:key", put(update_config))
        .route("/test", post(test_message))
}

async fn list_config(Inject(repo): Inject<dyn BotRepository>) -> Json<Vec<BotConfig>> {
    Json(repo.list_bot_config().await)
}

async fn update_config(
    Inject(repo): Inject<dyn BotRepository>,
    Path(key): Path<String>,
    body: Result<Json<UpdateBotConfig>, JsonRejection>,
) -> Result<Json<BotConfig>, ApiError> {
    let value = body
        .ok()
        .and_then(|Json(update)| update.value)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::bad_request("Value is required"))?;

    repo.update_bot_config(
        &key,
        BotConfigUpdate {
            value: Some(value),
            ..BotConfigUpdate::default()
        },
    )
    .await
    .map(Json)
    .ok_or_else(|| ApiError::not_found("Configuration key not found"))
}

/// Runs a made-up inbound message through the bot, as if the platform had sent it.
async fn test_message(
    Inject(service): Inject<dyn InboundService>,
    body: Result<Json<TestMessage>, JsonRejection>,
) -> Result<Json<StatusReply>, ApiError> {
    let missing = || ApiError::bad_request("Message and phone number are required");
    let Json(test) = body.map_err(|_| missing())?;

    let (Some(message), Some(phone_number)) = (
        test.message.filter(|message| !message.is_empty()),
        test.phone_number.filter(|phone_number| !phone_number.is_empty()),
    ) else {
        return Err(missing());
    };

    let now = Utc::now();
    let suffix = Uuid::new_v4().simple().to_string();
    service
        .process(InboundUnit {
            external_id: format!("test_{}_{}", now.timestamp_millis(), &suffix[..8]),
            from: phone_number,
            to: TEST_RECIPIENT.to_owned(),
            body: Some(message),
            kind: "text".to_owned(),
            external_timestamp: now.to_rfc3339(),
        })
        .await;

    Ok(Json(StatusReply {
        status: "Test message processed successfully".to_owned(),
    }))
}

pub mod schemas {
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug)]
    pub struct UpdateBotConfig {
        #[serde(default)]
        pub value: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct TestMessage {
        #[serde(default)]
        pub message: Option<String>,
        #[serde(default)]
        pub phone_number: Option<String>,
    }

    #[derive(Serialize, Debug)]
    pub struct StatusReply {
        pub status: String,
    }
}

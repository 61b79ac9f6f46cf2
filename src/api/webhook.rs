//! Messaging platform webhook endpoints

use crate::api::webhook::schemas::WebhookPayload;
use crate::api::{ApiError, ExtractVerification};
use crate::core::traits::InboundService;
use crate::infrastructure::entities::NewWebhookLog;
use crate::infrastructure::settings::WebhookSettings;
use crate::infrastructure::traits::BotRepository;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;
use log::{error, warn};
use std::time::Instant;

pub const WEBHOOK_PATH: &str = "/api/webhook";

pub fn router() -> Router {
    Router::new().route("/", get(verify).post(receive))
}

async fn verify(
    Inject(settings): Inject<WebhookSettings>,
    ExtractVerification(params): ExtractVerification,
) -> Result<String, ApiError> {
    if params.verify_token == settings.verify_token {
        Ok(params.challenge)
    } else {
        warn!("webhook verification failed: verify token mismatch");
        Err(ApiError::new(StatusCode::FORBIDDEN, "Verification failed"))
    }
}

/// Feeds every message of every change of every entry through the bot.
///
/// Failures inside the bot are swallowed so the platform does not redeliver; only a payload
/// that does not match the schema is answered with an error.
async fn receive(
    Inject(service): Inject<dyn InboundService>,
    Inject(repo): Inject<dyn BotRepository>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Response {
    let started = Instant::now();

    let failure = match payload {
        Ok(Json(payload)) => {
            for unit in payload.into_units() {
                service.process(unit).await;
            }
            None
        }
        Err(rejection) => {
            error!("Webhook processing error: {rejection}");
            Some(rejection.body_text())
        }
    };

    let status = match failure {
        None => StatusCode::OK,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    repo.create_webhook_log(NewWebhookLog {
        webhook_url: WEBHOOK_PATH.to_owned(),
        method: "POST".to_owned(),
        response_status: Some(status.as_u16()),
        response_time: Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)),
        is_successful: failure.is_none(),
        error_message: failure,
    })
    .await;

    if status.is_success() {
        (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
    } else {
        ApiError::new(status, "Webhook processing failed").into_response()
    }
}

pub mod schemas {
    use crate::core::traits::InboundUnit;
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct WebhookPayload {
        pub entry: Vec<Entry>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Entry {
        pub changes: Vec<Change>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Change {
        pub value: ChangeValue,
    }

    #[derive(Deserialize, Debug)]
    pub struct ChangeValue {
        #[serde(default)]
        pub messages: Option<Vec<InboundMessage>>,
        pub metadata: Metadata,
    }

    #[derive(Deserialize, Debug)]
    pub struct Metadata {
        pub display_phone_number: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct InboundMessage {
        pub id: String,
        pub from: String,
        pub timestamp: String,
        #[serde(default)]
        pub text: Option<Text>,
        #[serde(rename = "type")]
        pub kind: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct Text {
        pub body: String,
    }

    impl WebhookPayload {
        /// Flattens the delivery into units addressed to each change's display number.
        pub fn into_units(self) -> Vec<InboundUnit> {
            let mut units = Vec::new();

            for change in self.entry.into_iter().flat_map(|entry| entry.changes) {
                let recipient = change.value.metadata.display_phone_number;
                for message in change.value.messages.unwrap_or_default() {
                    units.push(InboundUnit {
                        external_id: message.id,
                        from: message.from,
                        to: recipient.clone(),
                        body: message.text.map(|text| text.body),
                        kind: message.kind,
                        external_timestamp: message.timestamp,
                    });
                }
            }

            units
        }
    }
}

//! Messages endpoints

use crate::api::ApiError;
use crate::api::messages::schemas::{Broadcast, BroadcastQueued, Paging};
use crate::core::traits::Notifier;
use crate::infrastructure::entities::Message;
use crate::infrastructure::traits::BotRepository;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use log::{info, warn};

const DEFAULT_PAGE_SIZE: usize = 50;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_messages))
        .route("/conversation/:phone_number", get(conversation_messages))
        .route("/broadcast", post(broadcast))
}

async fn list_messages(
    Inject(repo): Inject<dyn BotRepository>,
    Query(paging): Query<Paging>,
) -> Json<Vec<Message>> {
    let limit = paging
        .limit
        .and_then(|limit| limit.parse::<usize>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = paging
        .offset
        .and_then(|offset| offset.parse::<usize>().ok())
        .unwrap_or(0);

    Json(repo.list_messages(limit, offset).await)
}

async fn conversation_messages(
    Inject(repo): Inject<dyn BotRepository>,
    Path(phone_number): Path<String>,
) -> Json<Vec<Message>> {
    Json(repo.list_conversation_messages(&phone_number).await)
}

/// Sends a text to every active conversation.
async fn broadcast(
    Inject(repo): Inject<dyn BotRepository>,
    Inject(notifier): Inject<dyn Notifier>,
    body: Result<Json<Broadcast>, JsonRejection>,
) -> Result<Json<BroadcastQueued>, ApiError> {
    let Json(broadcast) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let message = broadcast.message.filter(|message| !message.is_empty());

    if message.is_none() && broadcast.template_id.is_none() {
        return Err(ApiError::bad_request(
            "Either message or templateId is required",
        ));
    }

    if let Some(template_id) = broadcast.template_id {
        repo.increment_template_usage(template_id)
            .await
            .ok_or_else(|| ApiError::not_found("Template not found"))?;
    }

    let recipients = repo.list_active_conversations().await;
    info!("Broadcasting to {} active conversations", recipients.len());

    if let Some(text) = &message {
        for conversation in &recipients {
            if let Err(e) = notifier.send(&conversation.phone_number, text).await {
                warn!(
                    "broadcast to {} failed: {e}",
                    conversation.phone_number
                );
            }
        }
    }

    Ok(Json(BroadcastQueued {
        status: "Broadcast queued".to_owned(),
        recipient_count: recipients.len(),
    }))
}

pub mod schemas {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    /// Paging is lenient: unparsable values fall back to the defaults.
    #[derive(Deserialize, Debug, Default)]
    pub struct Paging {
        pub limit: Option<String>,
        pub offset: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Broadcast {
        #[serde(default)]
        pub message: Option<String>,
        #[serde(default)]
        pub template_id: Option<Uuid>,
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct BroadcastQueued {
        pub status: String,
        pub recipient_count: usize,
    }
}

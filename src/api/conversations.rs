//! Conversations endpoints

use crate::api::conversations::schemas::ConversationList;
use crate::infrastructure::traits::BotRepository;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new().route("/", get(list_conversations))
}

async fn list_conversations(
    Inject(repo): Inject<dyn BotRepository>,
) -> (StatusCode, Json<ConversationList>) {
    let conversations = repo.list_active_conversations().await;

    (StatusCode::OK, Json(conversations))
}

pub mod schemas {
    use crate::infrastructure::entities;

    pub type ConversationList = Vec<entities::Conversation>;
}

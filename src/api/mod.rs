use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Deserialize;

pub mod bot;
pub mod conversations;
pub mod dashboard;
pub mod messages;
pub mod templates;
pub mod webhook;

const SUBSCRIBE_MODE: &str = "subscribe";

/// Every API route, mounted under `/api`.
pub fn router() -> Router {
    Router::new().nest(
        "/api",
        Router::new()
            .nest("/webhook", webhook::router())
            .nest("/messages", messages::router())
            .nest("/conversations", conversations::router())
            .nest("/templates", templates::router())
            .nest("/bot", bot::router())
            .merge(dashboard::router()),
    )
}

/// Error reply rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> ApiError {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> ApiError {
        ApiError::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> ApiError {
        ApiError::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct VerificationParams {
    #[serde(rename = "hub.mode")]
    pub mode: String,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: String,
    #[serde(rename = "hub.challenge")]
    pub challenge: String,
}

/// The `hub.*` query of a webhook subscription handshake.
#[derive(Debug)]
pub struct ExtractVerification(pub VerificationParams);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractVerification
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        let Query(params) = Query::<VerificationParams>::try_from_uri(&parts.uri)
            .map_err(|_| ApiError::bad_request("Invalid verification request"))?;

        if params.mode != SUBSCRIBE_MODE {
            return Err(ApiError::bad_request("Invalid verification request"));
        }

        Ok(ExtractVerification(params))
    }
}

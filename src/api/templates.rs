//! Message template endpoints

use crate::api::ApiError;
use crate::api::templates::schemas::CreateTemplate;
use crate::infrastructure::entities::{NewTemplate, Template, TemplateUpdate};
use crate::infrastructure::traits::BotRepository;
use axum::extract::Path;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route("/:id", put(update_template))
}

async fn list_templates(Inject(repo): Inject<dyn BotRepository>) -> Json<Vec<Template>> {
    Json(repo.list_templates().await)
}

async fn create_template(
    Inject(repo): Inject<dyn BotRepository>,
    body: Result<Json<CreateTemplate>, JsonRejection>,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    let Json(template) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    if template.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }

    let created = repo
        .create_template(NewTemplate {
            name: template.name,
            category: template.category,
            language: template.language,
            status: template.status,
            components: template.components,
        })
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_template(
    Inject(repo): Inject<dyn BotRepository>,
    Path(id): Path<Uuid>,
    body: Result<Json<TemplateUpdate>, JsonRejection>,
) -> Result<Json<Template>, ApiError> {
    let Json(update) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    repo.update_template(id, update)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Template not found"))
}

pub mod schemas {
    use crate::infrastructure::entities::{TemplateCategory, TemplateStatus};
    use serde::Deserialize;

    fn default_language() -> String {
        "en_US".to_owned()
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateTemplate {
        pub name: String,
        pub category: TemplateCategory,
        #[serde(default = "default_language")]
        pub language: String,
        #[serde(default)]
        pub status: TemplateStatus,
        pub components: serde_json::Value,
    }
}

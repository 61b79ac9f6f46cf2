//! API Integration Tests
//!
//! Drives the HTTP API in-process against the same service collection the binary uses.
//! Every test builds its own provider, so each one starts from a freshly seeded store.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use di::Ref;
use di_axum::RouterServiceProviderExtensions;
use serde_json::{Value, json};
use tower::ServiceExt;
use whatsapp_bot_api::infrastructure::entities::MessageStatus;
use whatsapp_bot_api::infrastructure::settings::WebhookSettings;
use whatsapp_bot_api::infrastructure::traits::BotRepository;
use whatsapp_bot_api::{api, services};

struct TestApp {
    router: axum::Router,
    repo: Ref<dyn BotRepository>,
    verify_token: String,
}

fn create_test_app() -> TestApp {
    let provider = services().build_provider().unwrap();
    let repo = provider.get_required::<dyn BotRepository>();
    let verify_token = provider
        .get_required::<WebhookSettings>()
        .verify_token
        .clone();

    TestApp {
        router: api::router().with_provider(provider),
        repo,
        verify_token,
    }
}

impl TestApp {
    async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn send_json(&self, method: &str, uri: &str, body: Value) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

async fn body_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn delivery(messages: Value) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "entry-1",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "display_phone_number": "15550001111", "phone_number_id": "1" },
                    "messages": messages
                }
            }]
        }]
    })
}

fn text_message(id: &str, from: &str, body: &str) -> Value {
    json!({
        "id": id,
        "from": from,
        "timestamp": "1760886000",
        "type": "text",
        "text": { "body": body }
    })
}

#[tokio::test]
async fn test_verification_echoes_challenge() {
    let app = create_test_app();

    let response = app
        .get(&format!(
            "/api/webhook?hub.mode=subscribe&hub.verify_token={}&hub.challenge=xyz123",
            app.verify_token
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "xyz123");
}

#[tokio::test]
async fn test_verification_wrong_token() {
    let app = create_test_app();

    let response = app
        .get("/api/webhook?hub.mode=subscribe&hub.verify_token=nope-not-it&hub.challenge=xyz123")
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Verification failed");
}

#[tokio::test]
async fn test_verification_malformed() {
    let app = create_test_app();

    let response = app.get("/api/webhook?hub.challenge=xyz123").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_delivery_processes_every_message() {
    let app = create_test_app();

    let payload = json!({
        "entry": [
            {
                "changes": [{
                    "value": {
                        "metadata": { "display_phone_number": "15550001111" },
                        "messages": [
                            { "id": "wamid.a", "from": "+1111", "timestamp": "1", "type": "text", "text": { "body": "/help" } },
                            { "id": "wamid.b", "from": "+2222", "timestamp": "2", "type": "text", "text": { "body": "hello" } }
                        ]
                    }
                }]
            },
            {
                "changes": [
                    { "value": { "metadata": { "display_phone_number": "15550001111" } } },
                    {
                        "value": {
                            "metadata": { "display_phone_number": "15550002222" },
                            "messages": [
                                { "id": "wamid.c", "from": "+1111", "timestamp": "3", "type": "image" }
                            ]
                        }
                    }
                ]
            }
        ]
    });

    let response = app.send_json("POST", "/api/webhook", payload).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));

    let messages = app.repo.all_messages().await;
    assert_eq!(messages.len(), 3);
    assert!(
        messages
            .iter()
            .all(|message| message.status == MessageStatus::Responded)
    );

    let image = app.repo.list_conversation_messages("+1111").await;
    assert_eq!(image.len(), 2);
    assert_eq!(image[1].to_number, "15550002222");
    assert_eq!(image[1].message_type, "image");

    let conversation = app.repo.get_conversation("+1111").await.unwrap();
    assert_eq!(conversation.message_count, 2);
    assert_eq!(conversation.last_command.as_deref(), Some("help"));

    let logs = app.repo.list_webhook_logs(10).await;
    assert_eq!(logs.len(), 1);
    assert!(logs[0].is_successful);
    assert_eq!(logs[0].response_status, Some(200));
}

#[tokio::test]
async fn test_webhook_duplicate_delivery_still_acknowledged() {
    let app = create_test_app();
    let payload = delivery(json!([text_message("wamid.dup", "+1111", "/info")]));

    let first = app.send_json("POST", "/api/webhook", payload.clone()).await;
    let second = app.send_json("POST", "/api/webhook", payload).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(app.repo.all_messages().await.len(), 1);
}

#[tokio::test]
async fn test_webhook_schema_failure() {
    let app = create_test_app();

    let response = app
        .send_json("POST", "/api/webhook", json!({ "entry": [{ "changes": [{ "value": {} }] }] }))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Webhook processing failed");
    assert!(app.repo.all_messages().await.is_empty());

    let logs = app.repo.list_webhook_logs(10).await;
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].is_successful);
    assert!(logs[0].error_message.is_some());
}

#[tokio::test]
async fn test_messages_listing_and_conversation_round_trip() {
    let app = create_test_app();

    app.send_json(
        "POST",
        "/api/webhook",
        delivery(json!([
            text_message("wamid.1", "+1111", "hello"),
            text_message("wamid.2", "+1111", "/contact"),
            text_message("wamid.3", "+3333", "hi")
        ])),
    )
    .await;

    let response = app.get("/api/messages?limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = app.get("/api/messages?limit=abc&offset=-1").await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);

    let response = app.get("/api/messages/conversation/+1111").await;
    let json = body_json(response).await;
    let history = json.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["whatsappMessageId"], "wamid.1");
    assert_eq!(history[0]["fromNumber"], "+1111");
    assert_eq!(history[0]["messageText"], "hello");
    assert_eq!(history[1]["isCommand"], true);
    assert_eq!(history[1]["commandName"], "contact");
    assert_eq!(history[1]["status"], "responded");

    let response = app.get("/api/conversations").await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_store_reads() {
    let app = create_test_app();

    for uri in [
        "/api/messages",
        "/api/messages/conversation/+1111",
        "/api/conversations",
        "/api/templates",
        "/api/webhooks/logs",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(body_json(response).await, json!([]), "{uri}");
    }

    let response = app.get("/api/dashboard/stats").await;
    let stats = body_json(response).await;
    assert_eq!(stats["messagesToday"], 0);
    assert_eq!(stats["responseRate"], 0.0);
    assert_eq!(stats["avgResponseTime"], 0);
}

#[tokio::test]
async fn test_dashboard_after_traffic() {
    let app = create_test_app();

    app.send_json(
        "POST",
        "/api/webhook",
        delivery(json!([
            text_message("wamid.1", "+1111", "/help"),
            text_message("wamid.2", "+2222", "/help"),
            text_message("wamid.3", "+2222", "hello")
        ])),
    )
    .await;

    let stats = body_json(app.get("/api/dashboard/stats").await).await;

    assert_eq!(stats["messagesToday"], 3);
    assert_eq!(stats["activeUsers"], 2);
    assert_eq!(stats["responseRate"], 100.0);
    assert_eq!(stats["recentMessages"].as_array().unwrap().len(), 3);
    assert_eq!(
        stats["commandStats"],
        json!([{ "name": "/help", "usage": 2, "description": "Show available commands" }])
    );
}

#[tokio::test]
async fn test_bot_config_endpoints() {
    let app = create_test_app();

    let configs = body_json(app.get("/api/bot/config").await).await;
    assert_eq!(configs.as_array().unwrap().len(), 5);
    assert_eq!(configs[0]["key"], "welcome_message");

    let response = app
        .send_json("PUT", "/api/bot/config/help_message", json!({ "value": "" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Value is required");

    let response = app
        .send_json("PUT", "/api/bot/config/nope", json!({ "value": "x" }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send_json("PUT", "/api/bot/config/help_message", json!({ "value": "Ask away" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["value"], "Ask away");

    app.send_json(
        "POST",
        "/api/bot/test",
        json!({ "message": "/help", "phoneNumber": "+4444" }),
    )
    .await;
    let history = app.repo.list_conversation_messages("+4444").await;
    assert_eq!(history[0].bot_response.as_deref(), Some("Ask away"));
}

#[tokio::test]
async fn test_bot_test_endpoint() {
    let app = create_test_app();

    let response = app
        .send_json("POST", "/api/bot/test", json!({ "message": "hello" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for _ in 0..2 {
        let response = app
            .send_json(
                "POST",
                "/api/bot/test",
                json!({ "message": "hello", "phoneNumber": "+5555" }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["status"],
            "Test message processed successfully"
        );
    }

    let history = app.repo.list_conversation_messages("+5555").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].to_number, "test_bot");
    assert!(history[0].whatsapp_message_id.starts_with("test_"));
    assert_eq!(history[0].status, MessageStatus::Responded);
}

#[tokio::test]
async fn test_template_endpoints() {
    let app = create_test_app();

    let response = app
        .send_json(
            "POST",
            "/api/templates",
            json!({ "name": "promo", "category": "newsletter", "components": [] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = app
        .send_json(
            "POST",
            "/api/templates",
            json!({ "name": "promo", "category": "marketing", "components": [{ "type": "BODY" }] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let template = body_json(response).await;
    assert_eq!(template["language"], "en_US");
    assert_eq!(template["status"], "pending");
    assert_eq!(template["usageCount"], 0);
    let id = template["id"].as_str().unwrap().to_owned();

    let response = app
        .send_json(
            "PUT",
            &format!("/api/templates/{id}"),
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "approved");

    let response = app
        .send_json(
            "PUT",
            "/api/templates/6f1c2a9e-0000-4000-8000-000000000000",
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send_json(
            "POST",
            "/api/messages/broadcast",
            json!({ "templateId": id }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["recipientCount"], 0);

    let templates = body_json(app.get("/api/templates").await).await;
    assert_eq!(templates[0]["usageCount"], 1);
}

#[tokio::test]
async fn test_broadcast_endpoint() {
    let app = create_test_app();

    let response = app
        .send_json("POST", "/api/messages/broadcast", json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send_json(
            "POST",
            "/api/messages/broadcast",
            json!({ "templateId": "6f1c2a9e-0000-4000-8000-000000000000" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.send_json(
        "POST",
        "/api/webhook",
        delivery(json!([
            text_message("wamid.1", "+1111", "hi"),
            text_message("wamid.2", "+2222", "hi")
        ])),
    )
    .await;

    let response = app
        .send_json(
            "POST",
            "/api/messages/broadcast",
            json!({ "message": "We are open on Sunday" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "status": "Broadcast queued", "recipientCount": 2 })
    );
}

#[tokio::test]
async fn test_analytics_rollup_and_range() {
    let app = create_test_app();

    app.send_json(
        "POST",
        "/api/webhook",
        delivery(json!([
            text_message("wamid.1", "+1111", "/help"),
            text_message("wamid.2", "+1111", "/order 7")
        ])),
    )
    .await;

    let response = app
        .send_json("POST", "/api/analytics/rollup", json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rollup = body_json(response).await;
    assert_eq!(rollup["messagesReceived"], 2);
    assert_eq!(rollup["messagesResponded"], 2);
    assert_eq!(rollup["activeUsers"], 1);
    assert_eq!(rollup["commandUsage"], json!({ "help": 1, "order": 1 }));

    let date = rollup["date"].as_str().unwrap().to_owned();
    let range = body_json(
        app.get(&format!("/api/analytics?start={date}&end={date}"))
            .await,
    )
    .await;
    assert_eq!(range.as_array().unwrap().len(), 1);

    let response = app.get("/api/analytics?start=yesterday").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

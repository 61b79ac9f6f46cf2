//! WhatsApp bot webhook server
//!

use whatsapp_bot_api::api;
use whatsapp_bot_api::infrastructure::settings::WebhookSettings;

use anyhow::anyhow;
use axum::http::{HeaderValue, Method};
use di_axum::RouterServiceProviderExtensions;
use log::info;
use tokio::runtime::{Builder, Runtime};
use tower_http::cors::{Any, CorsLayer};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(web_server_task())
}

async fn web_server_task() -> anyhow::Result<()> {
    let provider = whatsapp_bot_api::services()
        .build_provider()
        .map_err(|e| anyhow!("invalid service configuration: {e:?}"))?;

    let settings = provider.get_required::<WebhookSettings>();

    let app = api::router()
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT])
                .allow_origin([
                    HeaderValue::from_static("http://localhost:3000"),
                    HeaderValue::from_static("http://localhost:5173"),
                ]),
        )
        .with_provider(provider);

    let listener = tokio::net::TcpListener::bind(settings.bind_address.as_str()).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    info!("Shutting down...");

    Ok(())
}

//! Language tutor gateway
//!

use tutor_gateway::api;
use tutor_gateway::core::services::MyTutorService;
use tutor_gateway::infrastructure::config::GatewayConfig;
use tutor_gateway::infrastructure::upstream::AnthropicClient;

use anyhow::{Context, anyhow};
use di::{Injectable, ServiceCollection};
use log::{info, warn};
use tokio::runtime::{Builder, Runtime};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(web_server_task())
}

async fn web_server_task() -> anyhow::Result<()> {
    let config = GatewayConfig::create();
    if !config.has_credential() {
        warn!("no upstream credential configured, every reply will be a canned fallback");
    }

    let provider = ServiceCollection::new()
        .add(GatewayConfig::singleton())
        .add(AnthropicClient::singleton())
        .add(MyTutorService::scoped())
        .build_provider()
        .map_err(|e| anyhow!("failed to build service provider: {e:?}"))?;

    let app = api::app(provider);

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    info!("Shutting down...");

    Ok(())
}

// SPDX-FileCopyrightText: 2026 Fincabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `fincabot serve` command implementation.
//!
//! Wires storage, the OpenAI provider, the YCloud transport, and the
//! knowledge base into the inbound agent, then serves the webhook gateway
//! until ctrl-c.

use std::sync::Arc;

use fincabot_agent::inbox::InboxService;
use fincabot_agent::InboundAgent;
use fincabot_config::FincabotConfig;
use fincabot_core::FincabotError;
use fincabot_gateway::{start_server, AppState, ServerConfig};
use fincabot_openai::OpenAiClient;
use fincabot_storage::{Database, KnowledgeBase};
use fincabot_ycloud::YCloudClient;
use tracing::info;

/// Runs the `fincabot serve` command.
pub async fn run_serve(config: FincabotConfig) -> Result<(), FincabotError> {
    init_tracing(&config.agent.log_level);

    let openai_key = config
        .openai
        .api_key
        .clone()
        .ok_or_else(|| FincabotError::Config("openai.api_key is required".to_string()))?;
    let ycloud_key = config
        .ycloud
        .api_key
        .clone()
        .ok_or_else(|| FincabotError::Config("ycloud.api_key is required".to_string()))?;
    let waba_number = config
        .ycloud
        .waba_number
        .clone()
        .ok_or_else(|| FincabotError::Config("ycloud.waba_number is required".to_string()))?;

    let db = Database::open(&config.storage.database_path).await?;

    let generator = Arc::new(OpenAiClient::new(
        &openai_key,
        config.openai.base_url.clone(),
        config.openai.model.clone(),
        config.openai.max_tokens,
    )?);
    let transport = Arc::new(YCloudClient::new(
        &ycloud_key,
        config.ycloud.base_url.clone(),
        waba_number,
    )?);
    let knowledge = Arc::new(KnowledgeBase::new(db.clone()));

    let agent = Arc::new(InboundAgent::new(
        db.clone(),
        generator,
        transport.clone(),
        knowledge,
    ));
    let inbox = Arc::new(InboxService::new(db.clone(), transport));

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let state = AppState { agent, inbox };
    let server = tokio::spawn(async move { start_server(&server_config, state).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        result = server => {
            match result {
                Ok(Err(e)) => return Err(e),
                Err(e) => return Err(FincabotError::Internal(format!("gateway task failed: {e}"))),
                Ok(Ok(())) => {}
            }
        }
    }

    db.close().await?;
    info!("fincabot stopped");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fincabot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

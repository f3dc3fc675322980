//! Project Intake server entry point.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use project_intake::adapters::ai::{OpenAIConfig, OpenAIProvider};
use project_intake::adapters::http::{app_router, ProjectChatAppState};
use project_intake::application::handlers::{ProjectChatHandler, ProjectChatSettings};
use project_intake::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    config.validate()?;
    let addr = config.server.socket_addr()?;

    let provider = OpenAIProvider::new(OpenAIConfig::from(&config.ai))?;
    tracing::info!(
        provider = config.ai.provider_name(),
        model = %config.ai.resolved_model(),
        "AI provider configured"
    );

    let handler = Arc::new(ProjectChatHandler::new(
        Arc::new(provider),
        ProjectChatSettings::from(&config.chat),
    ));
    let state = ProjectChatAppState::new(handler, config.chat.max_message_chars);
    let app = app_router(state, &config.server.cors_origins_list());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_target(false)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

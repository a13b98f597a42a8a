// ABOUTME: Server binary for the AI chat portal
// ABOUTME: Loads environment configuration, opens the database, and serves the REST API
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # AI Chat Portal Server Binary
//!
//! Starts the chat portal REST API with user authentication, conversation
//! persistence, and the multi-provider adapter layer.

use anyhow::Result;
use chat_portal::{
    auth::AuthManager, config::ServerConfig, database::Database, llm::AiService, logging,
    server::{self, ServerResources},
};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "chat-portal")]
#[command(about = "AI Chat Portal - multi-provider chat backend with conversation analytics")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    info!("Starting AI Chat Portal");
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;

    let auth = AuthManager::new(&config.auth.jwt_secret, config.auth.jwt_expiry_hours);

    let ai = AiService::new(&config.providers);
    let configured = config.providers.configured_list();
    if configured.is_empty() {
        info!("No provider API keys configured; only LM Studio will be reachable");
    } else {
        info!("Configured providers: {}", configured.join(", "));
    }

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(database, auth, ai, config));

    info!("API available at http://localhost:{port}/api");

    server::run(resources).await
}

// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Builds in-memory server resources and registers users through the API
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
#![allow(dead_code)]

use anyhow::Result;
use axum::Router;
use chat_portal::{
    auth::AuthManager,
    config::{AuthConfig, ProviderKeys, ServerConfig, DEFAULT_LM_STUDIO_URL},
    database::Database,
    llm::AiService,
    server::{router, ServerResources},
};
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        auth: AuthConfig {
            jwt_secret: "integration-test-secret".to_owned(),
            jwt_expiry_hours: 24,
        },
        // No provider credentials: every adapter call fails fast without
        // touching the network
        providers: ProviderKeys {
            openai_api_key: None,
            anthropic_api_key: None,
            google_api_key: None,
            lm_studio_url: DEFAULT_LM_STUDIO_URL.to_owned(),
        },
        cors_origins: vec!["http://localhost:5173".to_owned()],
    }
}

/// Build server resources over a fresh in-memory database
pub async fn create_test_resources() -> Result<Arc<ServerResources>> {
    init_test_logging();

    let config = test_config();
    let database = Database::new(&config.database_url).await?;
    let auth = AuthManager::new(&config.auth.jwt_secret, config.auth.jwt_expiry_hours);
    let ai = AiService::new(&config.providers);

    Ok(Arc::new(ServerResources::new(database, auth, ai, config)))
}

/// Full application router over fresh resources
pub async fn create_test_app() -> Result<(Router, Arc<ServerResources>)> {
    let resources = create_test_resources().await?;
    Ok((router(resources.clone()), resources))
}

/// Register a user through the API, returning `(user_id, token)`
pub async fn register_user(app: Router, username: &str, email: &str) -> (Uuid, String) {
    let response = helpers_request::post_json(
        app,
        "/api/auth/register",
        &json!({
            "username": username,
            "email": email,
            "password": "password123",
        }),
    )
    .await;

    assert_eq!(response["success"], true, "registration failed: {response}");
    let user_id = response["data"]["user"]["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("registration response missing user id");
    let token = response["data"]["token"]
        .as_str()
        .expect("registration response missing token")
        .to_owned();

    (user_id, token)
}

mod helpers_request {
    use super::{Router, Value};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    pub async fn post_json(app: Router, uri: &str, body: &Value) -> Value {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");

        let response = app.oneshot(request).await.expect("Failed to execute request");
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        serde_json::from_slice(&bytes).expect("Response was not JSON")
    }
}

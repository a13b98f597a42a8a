// ABOUTME: Environment-driven server configuration
// ABOUTME: Reads ports, database location, JWT settings, and provider credentials from env vars
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! # Server Configuration
//!
//! All configuration is environment-driven. [`ServerConfig::from_env`] reads
//! the full set at startup; provider credentials are optional (a missing key
//! disables that provider with a configuration error at call time, not at
//! boot).
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `5000` |
//! | `DATABASE_URL` | `sqlite:chat_portal.db` |
//! | `JWT_SECRET` | required |
//! | `JWT_EXPIRY_HOURS` | `168` (7 days) |
//! | `OPENAI_API_KEY` | unset |
//! | `ANTHROPIC_API_KEY` | unset |
//! | `GOOGLE_API_KEY` | unset |
//! | `LM_STUDIO_URL` | `http://localhost:1234/v1` |
//! | `FRONTEND_URL` | `http://localhost:5173` |

use anyhow::{Context, Result};
use std::env;

/// Default HTTP port
const DEFAULT_PORT: u16 = 5000;

/// Default JWT expiry (7 days, matching the issued-token lifetime the
/// client relies on before its forced-logout-on-401 path triggers)
const DEFAULT_JWT_EXPIRY_HOURS: i64 = 168;

/// Default LM Studio endpoint (OpenAI-compatible local server)
pub const DEFAULT_LM_STUDIO_URL: &str = "http://localhost:1234/v1";

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port to listen on
    pub http_port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Authentication settings
    pub auth: AuthConfig,
    /// AI provider credentials
    pub providers: ProviderKeys,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}

/// JWT authentication settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub jwt_expiry_hours: i64,
}

/// Credentials and endpoints for the four AI providers
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// Anthropic API key
    pub anthropic_api_key: Option<String>,
    /// Google AI Studio API key
    pub google_api_key: Option<String>,
    /// LM Studio base URL (OpenAI-compatible, no real key required)
    pub lm_studio_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_SECRET` is unset or a numeric variable
    /// fails to parse.
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var("PORT") {
            Ok(port) => port.parse::<u16>().context("PORT must be a valid port number")?,
            Err(_) => DEFAULT_PORT,
        };

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:chat_portal.db".to_owned());

        let jwt_secret = env::var("JWT_SECRET")
            .context("JWT_SECRET environment variable must be set to a strong random value")?;

        let jwt_expiry_hours = match env::var("JWT_EXPIRY_HOURS") {
            Ok(hours) => hours
                .parse::<i64>()
                .context("JWT_EXPIRY_HOURS must be an integer")?,
            Err(_) => DEFAULT_JWT_EXPIRY_HOURS,
        };

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_owned());
        let mut cors_origins = vec![frontend_url, "http://localhost:3000".to_owned()];
        cors_origins.dedup();

        Ok(Self {
            http_port,
            database_url,
            auth: AuthConfig {
                jwt_secret,
                jwt_expiry_hours,
            },
            providers: ProviderKeys {
                openai_api_key: env::var("OPENAI_API_KEY").ok(),
                anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
                google_api_key: env::var("GOOGLE_API_KEY").ok(),
                lm_studio_url: env::var("LM_STUDIO_URL")
                    .unwrap_or_else(|_| DEFAULT_LM_STUDIO_URL.to_owned()),
            },
            cors_origins,
        })
    }

    /// One-line startup summary (never includes secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} database={} jwt_expiry={}h providers=[{}]",
            self.http_port,
            self.database_url,
            self.auth.jwt_expiry_hours,
            self.providers.configured_list().join(", ")
        )
    }
}

impl ProviderKeys {
    /// Names of providers with credentials present
    #[must_use]
    pub fn configured_list(&self) -> Vec<&'static str> {
        let mut configured = Vec::with_capacity(4);
        if self.openai_api_key.is_some() {
            configured.push("openai");
        }
        if self.anthropic_api_key.is_some() {
            configured.push("claude");
        }
        if self.google_api_key.is_some() {
            configured.push("gemini");
        }
        // LM Studio needs no key, only reachability
        configured.push("lmstudio");
        configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        env::remove_var("PORT");
        env::remove_var("DATABASE_URL");
        env::remove_var("JWT_EXPIRY_HOURS");
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("LM_STUDIO_URL");
        env::set_var("JWT_SECRET", "test-secret");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, DEFAULT_PORT);
        assert_eq!(config.database_url, "sqlite:chat_portal.db");
        assert_eq!(config.auth.jwt_expiry_hours, DEFAULT_JWT_EXPIRY_HOURS);
        assert!(config.providers.openai_api_key.is_none());
        assert_eq!(config.providers.lm_studio_url, DEFAULT_LM_STUDIO_URL);

        env::remove_var("JWT_SECRET");
    }

    #[test]
    #[serial]
    fn test_from_env_requires_jwt_secret() {
        env::remove_var("JWT_SECRET");
        let result = ServerConfig::from_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_summary_redacts_secrets() {
        let config = ServerConfig {
            http_port: 5000,
            database_url: "sqlite::memory:".to_owned(),
            auth: AuthConfig {
                jwt_secret: "super-secret".to_owned(),
                jwt_expiry_hours: 168,
            },
            providers: ProviderKeys {
                openai_api_key: Some("sk-test".to_owned()),
                lm_studio_url: DEFAULT_LM_STUDIO_URL.to_owned(),
                ..ProviderKeys::default()
            },
            cors_origins: vec!["http://localhost:5173".to_owned()],
        };

        let summary = config.summary();
        assert!(!summary.contains("super-secret"));
        assert!(!summary.contains("sk-test"));
        assert!(summary.contains("openai"));
    }
}

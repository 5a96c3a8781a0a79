//! Application configuration loaded from the environment

use reqwest::Url;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid URL in {0}: {1}")]
    InvalidUrl(String, String),
}

/// Figma OAuth 2.0 settings.
#[derive(Debug, Clone)]
pub struct FigmaOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    /// Base URL of the Figma authorization server (`https://www.figma.com`).
    pub authorization_server_base_url: Url,
    /// Scopes requested during the authorization grant.
    pub scope: String,
    /// Symmetric key used to sign the short-lived `state` token.
    pub state_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Connect app key, as declared in the app descriptor.
    pub app_key: String,
    /// Public base URL the app is served from.
    pub app_base_url: Url,
    /// Base URL of the Figma REST API (`https://api.figma.com`).
    pub figma_api_base_url: Url,
    /// Base URL of the Atlassian Connect public key server.
    pub connect_key_server_base_url: Url,
    pub figma_oauth2: FigmaOAuth2Config,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app_key: require("APP_KEY")?,
            app_base_url: require_url("APP_BASE_URL")?,
            figma_api_base_url: url_or_default("FIGMA_API_BASE_URL", "https://api.figma.com")?,
            connect_key_server_base_url: url_or_default(
                "CONNECT_KEY_SERVER_BASE_URL",
                "https://connect-install-keys.atlassian.com",
            )?,
            figma_oauth2: FigmaOAuth2Config {
                client_id: require("FIGMA_OAUTH2_CLIENT_ID")?,
                client_secret: require("FIGMA_OAUTH2_CLIENT_SECRET")?,
                authorization_server_base_url: url_or_default(
                    "FIGMA_OAUTH2_AUTHORIZATION_SERVER_BASE_URL",
                    "https://www.figma.com",
                )?,
                scope: std::env::var("FIGMA_OAUTH2_SCOPE")
                    .unwrap_or_else(|_| "files:read,file_dev_resources:read,file_dev_resources:write,webhooks:write".into()),
                state_secret: require("FIGMA_OAUTH2_STATE_SECRET")?,
            },
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:figma-connect.db?mode=rwc".into()),
        })
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.into()))
}

fn require_url(name: &str) -> Result<Url, ConfigError> {
    let raw = require(name)?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(name.into(), e.to_string()))
}

fn url_or_default(name: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.into());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(name.into(), e.to_string()))
}

/// Install the global tracing subscriber, filtered by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

//! Resolution of Atlassian Connect public signing keys.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::JwtError;

/// Resolves the RSA public key (PEM) for a given JWT `kid` header.
#[async_trait]
pub trait ConnectKeyProvider: Send + Sync {
    async fn get_verification_key(&self, key_id: &str) -> Result<String, JwtError>;
}

/// Fetches install-lifecycle signing keys from the Atlassian Connect CDN.
pub struct ConnectKeyServerClient {
    http: Client,
    base_url: Url,
}

impl ConnectKeyServerClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl ConnectKeyProvider for ConnectKeyServerClient {
    async fn get_verification_key(&self, key_id: &str) -> Result<String, JwtError> {
        let url = self
            .base_url
            .join(key_id)
            .map_err(|e| JwtError::Verification(format!("Invalid key id: {e}")))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| JwtError::Verification(format!("Key server request failed: {e}")))?;

        match response.status() {
            StatusCode::OK => response
                .text()
                .await
                .map_err(|e| JwtError::Verification(format!("Key server response: {e}"))),
            StatusCode::NOT_FOUND => Err(JwtError::Verification(format!(
                "Unknown key id: {key_id}"
            ))),
            status => Err(JwtError::Verification(format!(
                "Key server returned HTTP {status}"
            ))),
        }
    }
}

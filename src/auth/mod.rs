//! Figma OAuth 2.0 credential lifecycle.
//!
//! Hides token expiry from every other component: callers ask for
//! credentials and get back a live access token, refreshed transparently
//! when needed. Also owns the signed `state` token that protects the
//! authorization callback against CSRF.

pub mod passcode;

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;
use crate::config::FigmaOAuth2Config;
use crate::db::repositories::FigmaOAuth2UserCredentialsRepository;
use crate::db::schema::{
    ConnectInstallation, ConnectUserInfo, FigmaOAuth2UserCredentials,
    FigmaOAuth2UserCredentialsCreateParams,
};
use crate::db::DbError;
use crate::figma::{FigmaApi, FigmaError};
use crate::jwt::ConnectJwtClaims;

/// Lifetime of the OAuth 2.0 authorization `state` token.
const STATE_TOKEN_EXPIRES_IN_SECS: i64 = 5 * 60;

#[derive(Error, Debug)]
pub enum AuthError {
    /// No usable Figma credentials: never authorized, refresh rejected, or
    /// token revoked. Callers must restart the OAuth 2.0 grant flow rather
    /// than retry.
    #[error("Figma authorization required: {0}")]
    Unauthorized(String),

    #[error("Invalid OAuth 2.0 state token: {0}")]
    InvalidState(String),

    #[error("Figma API error: {0}")]
    Figma(FigmaError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

pub struct FigmaAuthService {
    credentials: Arc<dyn FigmaOAuth2UserCredentialsRepository>,
    figma_api: Arc<dyn FigmaApi>,
    clock: Arc<dyn Clock>,
    oauth2: FigmaOAuth2Config,
    app_base_url: Url,
}

impl FigmaAuthService {
    pub fn new(
        credentials: Arc<dyn FigmaOAuth2UserCredentialsRepository>,
        figma_api: Arc<dyn FigmaApi>,
        clock: Arc<dyn Clock>,
        oauth2: FigmaOAuth2Config,
        app_base_url: Url,
    ) -> Self {
        Self {
            credentials,
            figma_api,
            clock,
            oauth2,
            app_base_url,
        }
    }

    /// Exchanges an authorization code and stores the resulting credentials,
    /// fully replacing any prior credentials for the same user.
    pub async fn create_credentials(
        &self,
        code: &str,
        user: &ConnectUserInfo,
    ) -> Result<FigmaOAuth2UserCredentials, AuthError> {
        let response = self
            .figma_api
            .get_oauth2_token(code)
            .await
            .map_err(AuthError::Figma)?;

        let now = self.clock.now();
        let credentials = self
            .credentials
            .upsert(FigmaOAuth2UserCredentialsCreateParams {
                atlassian_user_id: user.atlassian_user_id.clone(),
                connect_installation_id: user.connect_installation_id.clone(),
                access_token: response.access_token,
                refresh_token: response.refresh_token,
                expires_at: now.timestamp() + response.expires_in,
            })
            .await?;

        Ok(credentials)
    }

    /// Returns live credentials for the user, refreshing the access token
    /// first when it has expired. The caller never sees token expiry.
    pub async fn get_credentials(
        &self,
        user: &ConnectUserInfo,
    ) -> Result<FigmaOAuth2UserCredentials, AuthError> {
        let credentials = self
            .credentials
            .get(user)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("No Figma credentials stored".into()))?;

        // One clock read per operation; the same instant decides expiry and
        // stamps the refreshed credentials.
        let now = self.clock.now();
        if !credentials.is_expired(now) {
            return Ok(credentials);
        }

        debug!(
            atlassian_user_id = %user.atlassian_user_id,
            "Figma access token expired, refreshing"
        );

        let response = self
            .figma_api
            .refresh_oauth2_token(&credentials.refresh_token)
            .await
            .map_err(|e| AuthError::Unauthorized(format!("Token refresh rejected: {e}")))?;

        let refresh_token = response
            .refresh_token
            .unwrap_or_else(|| credentials.refresh_token.clone());

        let refreshed = self
            .credentials
            .upsert(FigmaOAuth2UserCredentialsCreateParams {
                atlassian_user_id: credentials.atlassian_user_id,
                connect_installation_id: credentials.connect_installation_id,
                access_token: response.access_token,
                refresh_token,
                expires_at: now.timestamp() + response.expires_in,
            })
            .await?;

        Ok(refreshed)
    }

    /// Builds the Figma authorization redirect URL, including the signed
    /// short-lived `state` token binding the grant to this user and tenant.
    pub fn build_authorization_endpoint(
        &self,
        atlassian_user_id: &str,
        connect_installation: &ConnectInstallation,
        redirect_endpoint: &str,
    ) -> Result<Url, AuthError> {
        let now = self.clock.now();
        let claims = ConnectJwtClaims {
            iss: connect_installation.client_key.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + STATE_TOKEN_EXPIRES_IN_SECS,
            qsh: None,
            sub: Some(atlassian_user_id.to_string()),
            aud: Some(vec![self.app_base_url.to_string()]),
        };

        let state = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.oauth2.state_secret.as_bytes()),
        )
        .map_err(|e| AuthError::InvalidState(e.to_string()))?;

        let mut endpoint = self.oauth2.authorization_server_base_url.clone();
        endpoint.set_path("/oauth");
        endpoint
            .query_pairs_mut()
            .append_pair("client_id", &self.oauth2.client_id)
            .append_pair(
                "redirect_uri",
                &format!("{}{}", self.app_base_url, redirect_endpoint),
            )
            .append_pair("scope", &self.oauth2.scope)
            .append_pair("state", &state)
            .append_pair("response_type", "code");

        Ok(endpoint)
    }

    /// Verifies the `state` parameter of an authorization callback and
    /// returns `(atlassianUserId, connectClientKey)` it was issued for.
    pub fn verify_oauth2_state(&self, state: &str) -> Result<(String, String), AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(&[self.app_base_url.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let data = jsonwebtoken::decode::<ConnectJwtClaims>(
            state,
            &DecodingKey::from_secret(self.oauth2.state_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AuthError::InvalidState(e.to_string()))?;

        let atlassian_user_id = data
            .claims
            .sub
            .ok_or_else(|| AuthError::InvalidState("Missing `sub` claim".into()))?;

        Ok((atlassian_user_id, data.claims.iss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::testing::{
        installation_with_secret, stored_credentials, InMemoryFigmaOAuth2UserCredentialsRepository,
        MockFigmaApi,
    };
    use chrono::{TimeZone, Utc};

    fn oauth2_config() -> FigmaOAuth2Config {
        FigmaOAuth2Config {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            authorization_server_base_url: Url::parse("https://www.figma.com").unwrap(),
            scope: "files:read".into(),
            state_secret: "state-secret".into(),
        }
    }

    fn user() -> ConnectUserInfo {
        ConnectUserInfo {
            atlassian_user_id: "user-1".into(),
            connect_installation_id: "inst-1".into(),
        }
    }

    fn service(
        repo: Arc<InMemoryFigmaOAuth2UserCredentialsRepository>,
        api: Arc<MockFigmaApi>,
        now_ts: i64,
    ) -> FigmaAuthService {
        FigmaAuthService::new(
            repo,
            api,
            Arc::new(FixedClock(Utc.timestamp_opt(now_ts, 0).unwrap())),
            oauth2_config(),
            Url::parse("https://figma-connect.example.com").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_credentials_stores_exchanged_token() {
        let repo = Arc::new(InMemoryFigmaOAuth2UserCredentialsRepository::default());
        let api = Arc::new(MockFigmaApi::default());
        let service = service(repo.clone(), api.clone(), 1_000);

        let credentials = service.create_credentials("auth-code", &user()).await.unwrap();

        assert_eq!(credentials.access_token, "figd_access");
        assert_eq!(credentials.refresh_token, "figr_refresh");
        assert_eq!(credentials.expires_at, 1_000 + 7_776_000);
        assert_eq!(api.oauth2_token_calls(), vec!["auth-code"]);
        assert!(repo.get(&user()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_credentials_without_stored_credentials_is_unauthorized() {
        let repo = Arc::new(InMemoryFigmaOAuth2UserCredentialsRepository::default());
        let api = Arc::new(MockFigmaApi::default());
        let service = service(repo, api, 1_000);

        let err = service.get_credentials(&user()).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_get_credentials_does_not_refresh_live_token() {
        let repo = Arc::new(InMemoryFigmaOAuth2UserCredentialsRepository::with(vec![
            stored_credentials("user-1", "inst-1", "figd_live", 2_000),
        ]));
        let api = Arc::new(MockFigmaApi::default());
        let service = service(repo, api.clone(), 1_000);

        let first = service.get_credentials(&user()).await.unwrap();
        let second = service.get_credentials(&user()).await.unwrap();

        assert_eq!(first.access_token, "figd_live");
        assert_eq!(second.access_token, "figd_live");
        assert_eq!(api.refresh_call_count(), 0);
    }

    #[tokio::test]
    async fn test_get_credentials_refreshes_expired_token_once() {
        let repo = Arc::new(InMemoryFigmaOAuth2UserCredentialsRepository::with(vec![
            stored_credentials("user-1", "inst-1", "figd_stale", 500),
        ]));
        let api = Arc::new(MockFigmaApi::default());
        let service = service(repo, api.clone(), 1_000);

        let refreshed = service.get_credentials(&user()).await.unwrap();

        assert_eq!(refreshed.access_token, "figd_refreshed");
        assert_eq!(refreshed.expires_at, 1_000 + 7_776_000);
        // Original refresh token is kept when the provider does not rotate it
        assert_eq!(refreshed.refresh_token, "figr_refresh");
        assert_eq!(api.refresh_call_count(), 1);

        // The stored row now carries the fresh expiry, so no second refresh
        let again = service.get_credentials(&user()).await.unwrap();
        assert_eq!(again.access_token, "figd_refreshed");
        assert_eq!(api.refresh_call_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_rejection_is_unauthorized() {
        let repo = Arc::new(InMemoryFigmaOAuth2UserCredentialsRepository::with(vec![
            stored_credentials("user-1", "inst-1", "figd_stale", 500),
        ]));
        let api = Arc::new(MockFigmaApi::default());
        api.fail_refresh(401, "Token revoked");
        let service = service(repo, api, 1_000);

        let err = service.get_credentials(&user()).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_authorization_endpoint_state_roundtrip() {
        let repo = Arc::new(InMemoryFigmaOAuth2UserCredentialsRepository::default());
        let api = Arc::new(MockFigmaApi::default());
        let now = Utc::now().timestamp();
        let service = service(repo, api, now);
        let installation = installation_with_secret("tenant-1", "secret");

        let endpoint = service
            .build_authorization_endpoint("user-1", &installation, "figma/oauth/callback")
            .unwrap();

        assert_eq!(endpoint.host_str(), Some("www.figma.com"));
        assert_eq!(endpoint.path(), "/oauth");

        let state = endpoint
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap();

        let (user_id, client_key) = service.verify_oauth2_state(&state).unwrap();
        assert_eq!(user_id, "user-1");
        assert_eq!(client_key, "tenant-1");
    }

    #[tokio::test]
    async fn test_state_expires_after_five_minutes() {
        let repo = Arc::new(InMemoryFigmaOAuth2UserCredentialsRepository::default());
        let api = Arc::new(MockFigmaApi::default());
        // Issue the state more than five minutes in the past
        let issued_at = Utc::now().timestamp() - STATE_TOKEN_EXPIRES_IN_SECS - 60;
        let service = service(repo, api, issued_at);
        let installation = installation_with_secret("tenant-1", "secret");

        let endpoint = service
            .build_authorization_endpoint("user-1", &installation, "figma/oauth/callback")
            .unwrap();
        let state = endpoint
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap();

        let err = service.verify_oauth2_state(&state).unwrap_err();
        assert!(matches!(err, AuthError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_state_with_wrong_audience_is_rejected() {
        let repo = Arc::new(InMemoryFigmaOAuth2UserCredentialsRepository::default());
        let api = Arc::new(MockFigmaApi::default());
        let now = Utc::now().timestamp();
        let service = service(repo, api, now);

        let claims = ConnectJwtClaims {
            iss: "tenant-1".into(),
            iat: now,
            exp: now + STATE_TOKEN_EXPIRES_IN_SECS,
            qsh: None,
            sub: Some("user-1".into()),
            aud: Some(vec!["https://attacker.example.com/".into()]),
        };
        let state = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("state-secret".as_bytes()),
        )
        .unwrap();

        let err = service.verify_oauth2_state(&state).unwrap_err();
        assert!(matches!(err, AuthError::InvalidState(_)));
    }
}

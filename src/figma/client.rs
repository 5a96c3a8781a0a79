//! Figma REST API client with OAuth 2.0 bearer authentication.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use super::types::{
    CreateDevResourcesResponse, CreateWebhookRequest, DevResource, FigmaFile,
    FigmaFileNodesResponse, FigmaOAuth2TokenResponse, FigmaRefreshOAuth2TokenResponse,
    FigmaTeamProjectsResponse, FigmaUser, FigmaWebhook, GetDevResourcesResponse,
};
use super::FigmaError;
use crate::config::FigmaOAuth2Config;

/// The subset of the Figma REST API the app calls. A trait so use cases can
/// be tested against a recording double.
#[async_trait]
pub trait FigmaApi: Send + Sync {
    async fn get_oauth2_token(&self, code: &str) -> Result<FigmaOAuth2TokenResponse, FigmaError>;

    async fn refresh_oauth2_token(
        &self,
        refresh_token: &str,
    ) -> Result<FigmaRefreshOAuth2TokenResponse, FigmaError>;

    /// Lightweight authenticated call used as a token liveness probe.
    async fn me(&self, access_token: &str) -> Result<FigmaUser, FigmaError>;

    async fn get_file(&self, file_key: &str, access_token: &str)
        -> Result<FigmaFile, FigmaError>;

    async fn get_file_nodes(
        &self,
        file_key: &str,
        node_id: &str,
        access_token: &str,
    ) -> Result<FigmaFileNodesResponse, FigmaError>;

    async fn create_dev_resources(
        &self,
        resources: Vec<DevResource>,
        access_token: &str,
    ) -> Result<CreateDevResourcesResponse, FigmaError>;

    async fn get_dev_resources(
        &self,
        file_key: &str,
        node_id: &str,
        access_token: &str,
    ) -> Result<Vec<DevResource>, FigmaError>;

    async fn delete_dev_resource(
        &self,
        file_key: &str,
        dev_resource_id: &str,
        access_token: &str,
    ) -> Result<(), FigmaError>;

    async fn create_webhook(
        &self,
        request: CreateWebhookRequest,
        access_token: &str,
    ) -> Result<FigmaWebhook, FigmaError>;

    async fn delete_webhook(&self, webhook_id: &str, access_token: &str)
        -> Result<(), FigmaError>;

    async fn get_team_projects(
        &self,
        team_id: &str,
        access_token: &str,
    ) -> Result<FigmaTeamProjectsResponse, FigmaError>;
}

pub struct FigmaClient {
    http: Client,
    api_base_url: Url,
    oauth2: FigmaOAuth2Config,
    /// Registered OAuth 2.0 redirect URI of this deployment.
    redirect_uri: String,
}

impl FigmaClient {
    pub fn new(api_base_url: Url, oauth2: FigmaOAuth2Config, redirect_uri: String) -> Self {
        Self {
            http: Client::new(),
            api_base_url,
            oauth2,
            redirect_uri,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T, FigmaError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FigmaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FigmaError::UnexpectedResponse(e.to_string()))
    }

    async fn expect_success(response: Response) -> Result<(), FigmaError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FigmaError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FigmaApi for FigmaClient {
    async fn get_oauth2_token(&self, code: &str) -> Result<FigmaOAuth2TokenResponse, FigmaError> {
        let response = self
            .http
            .post(self.api_url("v1/oauth/token"))
            .basic_auth(&self.oauth2.client_id, Some(&self.oauth2.client_secret))
            .form(&[
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn refresh_oauth2_token(
        &self,
        refresh_token: &str,
    ) -> Result<FigmaRefreshOAuth2TokenResponse, FigmaError> {
        let response = self
            .http
            .post(self.api_url("v1/oauth/refresh"))
            .basic_auth(&self.oauth2.client_id, Some(&self.oauth2.client_secret))
            .form(&[("refresh_token", refresh_token)])
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn me(&self, access_token: &str) -> Result<FigmaUser, FigmaError> {
        let response = self
            .http
            .get(self.api_url("v1/me"))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn get_file(
        &self,
        file_key: &str,
        access_token: &str,
    ) -> Result<FigmaFile, FigmaError> {
        let response = self
            .http
            .get(self.api_url(&format!("v1/files/{file_key}")))
            .query(&[("depth", "1")])
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn get_file_nodes(
        &self,
        file_key: &str,
        node_id: &str,
        access_token: &str,
    ) -> Result<FigmaFileNodesResponse, FigmaError> {
        let response = self
            .http
            .get(self.api_url(&format!("v1/files/{file_key}/nodes")))
            .query(&[("ids", node_id)])
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn create_dev_resources(
        &self,
        resources: Vec<DevResource>,
        access_token: &str,
    ) -> Result<CreateDevResourcesResponse, FigmaError> {
        let response = self
            .http
            .post(self.api_url("v1/dev_resources"))
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "dev_resources": resources }))
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn get_dev_resources(
        &self,
        file_key: &str,
        node_id: &str,
        access_token: &str,
    ) -> Result<Vec<DevResource>, FigmaError> {
        let response = self
            .http
            .get(self.api_url(&format!("v1/files/{file_key}/dev_resources")))
            .query(&[("node_ids", node_id)])
            .bearer_auth(access_token)
            .send()
            .await?;

        let body: GetDevResourcesResponse = Self::expect_json(response).await?;
        Ok(body.dev_resources)
    }

    async fn delete_dev_resource(
        &self,
        file_key: &str,
        dev_resource_id: &str,
        access_token: &str,
    ) -> Result<(), FigmaError> {
        let response = self
            .http
            .delete(self.api_url(&format!(
                "v1/files/{file_key}/dev_resources/{dev_resource_id}"
            )))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::expect_success(response).await
    }

    async fn create_webhook(
        &self,
        request: CreateWebhookRequest,
        access_token: &str,
    ) -> Result<FigmaWebhook, FigmaError> {
        let response = self
            .http
            .post(self.api_url("v2/webhooks"))
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn delete_webhook(
        &self,
        webhook_id: &str,
        access_token: &str,
    ) -> Result<(), FigmaError> {
        let response = self
            .http
            .delete(self.api_url(&format!("v2/webhooks/{webhook_id}")))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::expect_success(response).await
    }

    async fn get_team_projects(
        &self,
        team_id: &str,
        access_token: &str,
    ) -> Result<FigmaTeamProjectsResponse, FigmaError> {
        let response = self
            .http
            .get(self.api_url(&format!("v1/teams/{team_id}/projects")))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::expect_json(response).await
    }
}

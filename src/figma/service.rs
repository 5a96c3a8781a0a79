//! Figma design service.
//!
//! Sits between the use cases and the raw REST client: resolves the
//! caller's OAuth 2.0 credentials, probes that they are still accepted by
//! Figma, and maps file/node responses onto the design shape Jira ingests.

use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, warn};

use super::client::FigmaApi;
use super::transformer::{
    build_design_url, transform_file_to_atlassian_design, transform_node_to_atlassian_design,
};
use super::types::{CreateWebhookRequest, DevResource, FigmaUser, FigmaWebhook};
use super::FigmaError;
use crate::auth::{AuthError, FigmaAuthService};
use crate::db::schema::ConnectUserInfo;
use crate::models::{AtlassianDesign, FigmaDesignIdentifier};

const FILE_UPDATE_EVENT: &str = "FILE_UPDATE";

pub struct FigmaService {
    api: Arc<dyn FigmaApi>,
    auth: Arc<FigmaAuthService>,
    /// Base of user-facing design URLs, `https://www.figma.com/`.
    figma_base_url: Url,
    /// Absolute URL Figma delivers webhook events to.
    webhook_endpoint: String,
}

impl FigmaService {
    pub fn new(
        api: Arc<dyn FigmaApi>,
        auth: Arc<FigmaAuthService>,
        figma_base_url: Url,
        webhook_endpoint: String,
    ) -> Self {
        Self {
            api,
            auth,
            figma_base_url,
            webhook_endpoint,
        }
    }

    /// Resolves a live access token for the user. Every credential failure
    /// collapses into `Forbidden`: the fix is always to restart the
    /// authorization flow.
    async fn resolve_access_token(&self, user: &ConnectUserInfo) -> Result<String, FigmaError> {
        let credentials = self.auth.get_credentials(user).await.map_err(|e| match e {
            AuthError::Unauthorized(reason) => FigmaError::Forbidden(reason),
            AuthError::Figma(inner) => inner,
            AuthError::Database(inner) => FigmaError::Database(inner),
            AuthError::InvalidState(reason) => FigmaError::Forbidden(reason),
        })?;
        Ok(credentials.access_token)
    }

    /// Resolves the access token and verifies Figma still accepts it.
    async fn get_valid_access_token(&self, user: &ConnectUserInfo) -> Result<String, FigmaError> {
        let access_token = self.resolve_access_token(user).await?;
        match self.api.me(&access_token).await {
            Ok(_) => Ok(access_token),
            Err(e) if e.is_auth_rejection() => {
                Err(FigmaError::Forbidden("Access token rejected".into()))
            }
            Err(e) => Err(e),
        }
    }

    /// Profile of the Figma account behind the user's stored credentials.
    pub async fn get_current_user(&self, user: &ConnectUserInfo) -> Result<FigmaUser, FigmaError> {
        let access_token = self.resolve_access_token(user).await?;
        match self.api.me(&access_token).await {
            Err(e) if e.is_auth_rejection() => {
                Err(FigmaError::Forbidden("Access token rejected".into()))
            }
            other => other,
        }
    }

    /// Whether the user currently holds working Figma credentials.
    pub async fn check_auth(&self, user: &ConnectUserInfo) -> Result<bool, FigmaError> {
        match self.get_valid_access_token(user).await {
            Ok(_) => Ok(true),
            Err(FigmaError::Forbidden(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fetches design metadata for a file or a node within it.
    pub async fn fetch_design(
        &self,
        design_id: &FigmaDesignIdentifier,
        user: &ConnectUserInfo,
    ) -> Result<AtlassianDesign, FigmaError> {
        let access_token = self.get_valid_access_token(user).await?;
        let design_url = build_design_url(&self.figma_base_url, design_id);

        match &design_id.node_id {
            Some(node_id) => {
                let response = self
                    .api
                    .get_file_nodes(&design_id.file_key, node_id, &access_token)
                    .await?;
                Ok(transform_node_to_atlassian_design(
                    design_id,
                    &design_url,
                    &response,
                ))
            }
            None => {
                let file = self.api.get_file(&design_id.file_key, &access_token).await?;
                Ok(transform_file_to_atlassian_design(
                    design_id,
                    &design_url,
                    &file,
                ))
            }
        }
    }

    /// Adds a dev resource pointing back at a Jira issue. Per-resource
    /// errors in an otherwise successful response are logged, not raised.
    pub async fn create_dev_resource(
        &self,
        design_id: &FigmaDesignIdentifier,
        resource_name: &str,
        resource_url: &str,
        user: &ConnectUserInfo,
    ) -> Result<(), FigmaError> {
        let access_token = self.get_valid_access_token(user).await?;
        let response = self
            .api
            .create_dev_resources(
                vec![DevResource {
                    id: None,
                    name: resource_name.to_string(),
                    url: resource_url.to_string(),
                    file_key: design_id.file_key.clone(),
                    node_id: design_id.node_id_or_default().to_string(),
                }],
                &access_token,
            )
            .await?;

        for error in &response.errors {
            warn!(
                file_key = %design_id.file_key,
                error = %error.error,
                "Dev resource was not created"
            );
        }
        Ok(())
    }

    /// Deletes the dev resource with the given URL if one exists. A missing
    /// resource is not an error.
    pub async fn delete_dev_resource_if_exists(
        &self,
        design_id: &FigmaDesignIdentifier,
        resource_url: &str,
        user: &ConnectUserInfo,
    ) -> Result<(), FigmaError> {
        let access_token = self.get_valid_access_token(user).await?;
        let resources = self
            .api
            .get_dev_resources(
                &design_id.file_key,
                design_id.node_id_or_default(),
                &access_token,
            )
            .await?;

        let Some(resource) = resources.iter().find(|r| r.url == resource_url) else {
            debug!(
                file_key = %design_id.file_key,
                url = resource_url,
                "No dev resource to delete"
            );
            return Ok(());
        };

        let Some(resource_id) = &resource.id else {
            return Ok(());
        };
        self.api
            .delete_dev_resource(&design_id.file_key, resource_id, &access_token)
            .await
    }

    /// Registers a `FILE_UPDATE` webhook for the team, delivering to this
    /// deployment's webhook endpoint with the given passcode.
    pub async fn create_file_update_webhook(
        &self,
        team_id: &str,
        passcode: &str,
        user: &ConnectUserInfo,
    ) -> Result<FigmaWebhook, FigmaError> {
        let access_token = self.get_valid_access_token(user).await?;
        self.api
            .create_webhook(
                CreateWebhookRequest {
                    event_type: FILE_UPDATE_EVENT.to_string(),
                    team_id: team_id.to_string(),
                    endpoint: self.webhook_endpoint.clone(),
                    passcode: passcode.to_string(),
                    description: "Figma for Jira".to_string(),
                },
                &access_token,
            )
            .await
    }

    /// Best-effort webhook removal. Failures (revoked credentials, webhook
    /// already gone) are logged and swallowed so teardown flows can proceed.
    pub async fn try_delete_webhook(&self, webhook_id: &str, user: &ConnectUserInfo) {
        let access_token = match self.get_valid_access_token(user).await {
            Ok(token) => token,
            Err(e) => {
                warn!(webhook_id, error = %e, "Cannot delete webhook without credentials");
                return;
            }
        };

        if let Err(e) = self.api.delete_webhook(webhook_id, &access_token).await {
            warn!(webhook_id, error = %e, "Failed to delete webhook");
        }
    }

    /// Resolves a team's display name.
    pub async fn get_team_name(
        &self,
        team_id: &str,
        user: &ConnectUserInfo,
    ) -> Result<String, FigmaError> {
        let access_token = self.get_valid_access_token(user).await?;
        let response = self.api.get_team_projects(team_id, &access_token).await?;
        Ok(response.name)
    }
}

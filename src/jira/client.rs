//! Jira REST API client.
//!
//! Every request is signed with a short-lived symmetric Connect JWT built
//! from the installation's shared secret and bound to the request by its
//! `qsh` claim.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::types::{
    CheckPermissionsRequest, CheckPermissionsResponse, IssueProperty, JiraIssue,
    SubmitDesignsRequest, SubmitDesignsResponse,
};
use super::JiraError;
use crate::clock::Clock;
use crate::db::schema::ConnectInstallation;
use crate::jwt::{create_connect_jwt, JwtRequest};

/// Outbound token lifetime: 3 minutes.
const TOKEN_EXPIRES_IN_SECS: i64 = 3 * 60;

/// The subset of the Jira REST API the app calls.
#[async_trait]
pub trait JiraApi: Send + Sync {
    /// Bulk insert/update design data via Jira's design-ingestion endpoint.
    async fn submit_designs(
        &self,
        request: SubmitDesignsRequest,
        installation: &ConnectInstallation,
    ) -> Result<SubmitDesignsResponse, JiraError>;

    async fn get_issue(
        &self,
        issue_id_or_key: &str,
        installation: &ConnectInstallation,
    ) -> Result<JiraIssue, JiraError>;

    /// `Err(JiraError::NotFound)` when the property is not set.
    async fn get_issue_property(
        &self,
        issue_id_or_key: &str,
        property_key: &str,
        installation: &ConnectInstallation,
    ) -> Result<IssueProperty, JiraError>;

    async fn set_issue_property(
        &self,
        issue_id_or_key: &str,
        property_key: &str,
        value: serde_json::Value,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError>;

    async fn delete_issue_property(
        &self,
        issue_id_or_key: &str,
        property_key: &str,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError>;

    async fn check_permissions(
        &self,
        request: CheckPermissionsRequest,
        installation: &ConnectInstallation,
    ) -> Result<CheckPermissionsResponse, JiraError>;

    async fn set_app_property(
        &self,
        property_key: &str,
        value: serde_json::Value,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError>;
}

pub struct JiraClient {
    http: Client,
    app_key: String,
    clock: Arc<dyn Clock>,
}

impl JiraClient {
    pub fn new(app_key: String, clock: Arc<dyn Clock>) -> Self {
        Self {
            http: Client::new(),
            app_key,
            clock,
        }
    }

    fn signed_request(
        &self,
        method: Method,
        path: &str,
        installation: &ConnectInstallation,
    ) -> Result<RequestBuilder, JiraError> {
        let token = create_connect_jwt(
            &JwtRequest::new(method.as_str(), path),
            &self.app_key,
            &installation.shared_secret,
            self.clock.now(),
            TOKEN_EXPIRES_IN_SECS,
        )?;

        let url = format!("{}{}", installation.base_url.trim_end_matches('/'), path);
        Ok(self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("JWT {token}")))
    }

    async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T, JiraError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(JiraError::NotFound);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(JiraError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| JiraError::UnexpectedResponse(e.to_string()))
    }

    async fn expect_success(response: Response) -> Result<(), JiraError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(JiraError::NotFound);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(JiraError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl JiraApi for JiraClient {
    async fn submit_designs(
        &self,
        request: SubmitDesignsRequest,
        installation: &ConnectInstallation,
    ) -> Result<SubmitDesignsResponse, JiraError> {
        let response = self
            .signed_request(Method::POST, "/rest/designs/1.0/bulk", installation)?
            .json(&request)
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn get_issue(
        &self,
        issue_id_or_key: &str,
        installation: &ConnectInstallation,
    ) -> Result<JiraIssue, JiraError> {
        let path = format!("/rest/agile/1.0/issue/{issue_id_or_key}");
        let response = self
            .signed_request(Method::GET, &path, installation)?
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn get_issue_property(
        &self,
        issue_id_or_key: &str,
        property_key: &str,
        installation: &ConnectInstallation,
    ) -> Result<IssueProperty, JiraError> {
        let path = format!("/rest/api/2/issue/{issue_id_or_key}/properties/{property_key}");
        let response = self
            .signed_request(Method::GET, &path, installation)?
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn set_issue_property(
        &self,
        issue_id_or_key: &str,
        property_key: &str,
        value: serde_json::Value,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        let path = format!("/rest/api/2/issue/{issue_id_or_key}/properties/{property_key}");
        let response = self
            .signed_request(Method::PUT, &path, installation)?
            .json(&value)
            .send()
            .await?;

        Self::expect_success(response).await
    }

    async fn delete_issue_property(
        &self,
        issue_id_or_key: &str,
        property_key: &str,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        let path = format!("/rest/api/2/issue/{issue_id_or_key}/properties/{property_key}");
        let response = self
            .signed_request(Method::DELETE, &path, installation)?
            .send()
            .await?;

        Self::expect_success(response).await
    }

    async fn check_permissions(
        &self,
        request: CheckPermissionsRequest,
        installation: &ConnectInstallation,
    ) -> Result<CheckPermissionsResponse, JiraError> {
        let response = self
            .signed_request(Method::POST, "/rest/api/2/permissions/check", installation)?
            .json(&serde_json::json!({
                "accountId": request.account_id,
                "globalPermissions": request.global_permissions,
            }))
            .send()
            .await?;

        Self::expect_json(response).await
    }

    async fn set_app_property(
        &self,
        property_key: &str,
        value: serde_json::Value,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        let path = format!(
            "/rest/atlassian-connect/1/addons/{}/properties/{property_key}",
            self.app_key
        );
        let response = self
            .signed_request(Method::PUT, &path, installation)?
            .json(&value)
            .send()
            .await?;

        Self::expect_success(response).await
    }
}

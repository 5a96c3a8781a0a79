//! Shared test doubles: in-memory repositories and recording API mocks.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::repositories::{
    AssociatedFigmaDesignRepository, ConnectInstallationRepository,
    FigmaOAuth2UserCredentialsRepository, FigmaTeamRepository,
};
use crate::db::schema::{
    AssociatedFigmaDesign, AssociatedFigmaDesignCreateParams, ConnectInstallation,
    ConnectInstallationCreateParams, ConnectUserInfo, FigmaOAuth2UserCredentials,
    FigmaOAuth2UserCredentialsCreateParams, FigmaTeam, FigmaTeamAuthStatus, FigmaTeamCreateParams,
};
use crate::db::DbError;
use crate::figma::types::{
    CreateDevResourcesResponse, CreateWebhookRequest, DevResource, FigmaFile, FigmaFileNode,
    FigmaFileNodesResponse, FigmaNodeDocument, FigmaOAuth2TokenResponse,
    FigmaRefreshOAuth2TokenResponse, FigmaTeamProjectsResponse, FigmaUser, FigmaWebhook,
};
use crate::figma::{FigmaApi, FigmaError};
use crate::jira::types::{
    CheckPermissionsRequest, CheckPermissionsResponse, DesignSubmission, IssueProperty, JiraIssue,
    JiraIssueFields, RejectedDesign, RejectionError, SubmitDesignsRequest, SubmitDesignsResponse,
};
use crate::jira::{JiraApi, JiraError};

pub fn installation_with_secret(client_key: &str, shared_secret: &str) -> ConnectInstallation {
    ConnectInstallation {
        id: format!("inst-{client_key}"),
        key: "figma-connect".into(),
        client_key: client_key.into(),
        shared_secret: shared_secret.into(),
        base_url: "https://example.atlassian.net".into(),
        display_url: "https://example.atlassian.net".into(),
    }
}

pub fn stored_credentials(
    atlassian_user_id: &str,
    connect_installation_id: &str,
    access_token: &str,
    expires_at: i64,
) -> FigmaOAuth2UserCredentials {
    FigmaOAuth2UserCredentials {
        id: Uuid::new_v4().to_string(),
        atlassian_user_id: atlassian_user_id.into(),
        connect_installation_id: connect_installation_id.into(),
        access_token: access_token.into(),
        refresh_token: "figr_refresh".into(),
        expires_at,
    }
}

#[derive(Default)]
pub struct InMemoryConnectInstallationRepository {
    rows: Mutex<Vec<ConnectInstallation>>,
}

impl InMemoryConnectInstallationRepository {
    pub fn with(rows: Vec<ConnectInstallation>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn rows(&self) -> Vec<ConnectInstallation> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectInstallationRepository for InMemoryConnectInstallationRepository {
    async fn get(&self, id: &str) -> Result<Option<ConnectInstallation>, DbError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }

    async fn get_by_client_key(
        &self,
        client_key: &str,
    ) -> Result<Option<ConnectInstallation>, DbError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.client_key == client_key)
            .cloned())
    }

    async fn upsert(
        &self,
        params: ConnectInstallationCreateParams,
    ) -> Result<ConnectInstallation, DbError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|row| row.client_key == params.client_key) {
            existing.key = params.key;
            existing.shared_secret = params.shared_secret;
            existing.base_url = params.base_url;
            existing.display_url = params.display_url;
            return Ok(existing.clone());
        }

        let row = ConnectInstallation {
            id: Uuid::new_v4().to_string(),
            key: params.key,
            client_key: params.client_key,
            shared_secret: params.shared_secret,
            base_url: params.base_url,
            display_url: params.display_url,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn delete_by_client_key(&self, client_key: &str) -> Result<(), DbError> {
        self.rows
            .lock()
            .unwrap()
            .retain(|row| row.client_key != client_key);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryFigmaOAuth2UserCredentialsRepository {
    rows: Mutex<Vec<FigmaOAuth2UserCredentials>>,
}

impl InMemoryFigmaOAuth2UserCredentialsRepository {
    pub fn with(rows: Vec<FigmaOAuth2UserCredentials>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }
}

#[async_trait]
impl FigmaOAuth2UserCredentialsRepository for InMemoryFigmaOAuth2UserCredentialsRepository {
    async fn get(
        &self,
        user: &ConnectUserInfo,
    ) -> Result<Option<FigmaOAuth2UserCredentials>, DbError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| {
                row.atlassian_user_id == user.atlassian_user_id
                    && row.connect_installation_id == user.connect_installation_id
            })
            .cloned())
    }

    async fn upsert(
        &self,
        params: FigmaOAuth2UserCredentialsCreateParams,
    ) -> Result<FigmaOAuth2UserCredentials, DbError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|row| {
            !(row.atlassian_user_id == params.atlassian_user_id
                && row.connect_installation_id == params.connect_installation_id)
        });

        let row = FigmaOAuth2UserCredentials {
            id: Uuid::new_v4().to_string(),
            atlassian_user_id: params.atlassian_user_id,
            connect_installation_id: params.connect_installation_id,
            access_token: params.access_token,
            refresh_token: params.refresh_token,
            expires_at: params.expires_at,
        };
        rows.push(row.clone());
        Ok(row)
    }
}

#[derive(Default)]
pub struct InMemoryFigmaTeamRepository {
    rows: Mutex<Vec<FigmaTeam>>,
}

impl InMemoryFigmaTeamRepository {
    pub fn with(rows: Vec<FigmaTeam>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub fn rows(&self) -> Vec<FigmaTeam> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl FigmaTeamRepository for InMemoryFigmaTeamRepository {
    async fn get_by_webhook_id(&self, webhook_id: &str) -> Result<Option<FigmaTeam>, DbError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.webhook_id == webhook_id)
            .cloned())
    }

    async fn get_by_team_id_and_installation_id(
        &self,
        team_id: &str,
        connect_installation_id: &str,
    ) -> Result<Option<FigmaTeam>, DbError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| {
                row.team_id == team_id && row.connect_installation_id == connect_installation_id
            })
            .cloned())
    }

    async fn upsert(&self, params: FigmaTeamCreateParams) -> Result<FigmaTeam, DbError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|row| {
            !(row.team_id == params.team_id
                && row.connect_installation_id == params.connect_installation_id)
        });

        let row = FigmaTeam {
            id: Uuid::new_v4().to_string(),
            team_id: params.team_id,
            team_name: params.team_name,
            webhook_id: params.webhook_id,
            webhook_passcode: params.webhook_passcode,
            figma_admin_atlassian_user_id: params.figma_admin_atlassian_user_id,
            auth_status: params.auth_status,
            connect_installation_id: params.connect_installation_id,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn update_auth_status(
        &self,
        id: &str,
        auth_status: FigmaTeamAuthStatus,
    ) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
            row.auth_status = auth_status;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), DbError> {
        self.rows.lock().unwrap().retain(|row| row.id != id);
        Ok(())
    }

    async fn find_many_by_installation_id(
        &self,
        connect_installation_id: &str,
    ) -> Result<Vec<FigmaTeam>, DbError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.connect_installation_id == connect_installation_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryAssociatedFigmaDesignRepository {
    rows: Mutex<Vec<AssociatedFigmaDesign>>,
}

impl InMemoryAssociatedFigmaDesignRepository {
    pub fn rows(&self) -> Vec<AssociatedFigmaDesign> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssociatedFigmaDesignRepository for InMemoryAssociatedFigmaDesignRepository {
    async fn upsert(
        &self,
        params: AssociatedFigmaDesignCreateParams,
    ) -> Result<AssociatedFigmaDesign, DbError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter().find(|row| {
            row.file_key == params.file_key
                && row.node_id == params.node_id
                && row.associated_with_ari == params.associated_with_ari
                && row.connect_installation_id == params.connect_installation_id
        }) {
            return Ok(existing.clone());
        }

        let row = AssociatedFigmaDesign {
            id: Uuid::new_v4().to_string(),
            file_key: params.file_key,
            node_id: params.node_id,
            associated_with_ari: params.associated_with_ari,
            connect_installation_id: params.connect_installation_id,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn delete(&self, params: AssociatedFigmaDesignCreateParams) -> Result<(), DbError> {
        self.rows.lock().unwrap().retain(|row| {
            !(row.file_key == params.file_key
                && row.node_id == params.node_id
                && row.associated_with_ari == params.associated_with_ari
                && row.connect_installation_id == params.connect_installation_id)
        });
        Ok(())
    }

    async fn find_many_by_file_key_and_installation_id(
        &self,
        file_key: &str,
        connect_installation_id: &str,
    ) -> Result<Vec<AssociatedFigmaDesign>, DbError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| {
                row.file_key == file_key
                    && row.connect_installation_id == connect_installation_id
            })
            .cloned()
            .collect())
    }
}

/// Recording double for the Figma REST API with canned responses.
#[derive(Default)]
pub struct MockFigmaApi {
    oauth2_token_calls: Mutex<Vec<String>>,
    refresh_calls: Mutex<usize>,
    refresh_failure: Mutex<Option<(u16, String)>>,
    me_failure: Mutex<Option<(u16, String)>>,
    file_nodes: Mutex<HashMap<String, String>>,
    dev_resources: Mutex<Vec<DevResource>>,
    created_dev_resources: Mutex<Vec<DevResource>>,
    deleted_dev_resources: Mutex<Vec<String>>,
    webhook_requests: Mutex<Vec<CreateWebhookRequest>>,
    webhook_creation_failure: Mutex<Option<(u16, String)>>,
    deleted_webhooks: Mutex<Vec<String>>,
    failing_webhook_ids: Mutex<HashSet<String>>,
    team_name: Mutex<Option<String>>,
}

impl MockFigmaApi {
    pub fn oauth2_token_calls(&self) -> Vec<String> {
        self.oauth2_token_calls.lock().unwrap().clone()
    }

    pub fn refresh_call_count(&self) -> usize {
        *self.refresh_calls.lock().unwrap()
    }

    pub fn fail_refresh(&self, status: u16, message: &str) {
        *self.refresh_failure.lock().unwrap() = Some((status, message.into()));
    }

    pub fn fail_me(&self, status: u16, message: &str) {
        *self.me_failure.lock().unwrap() = Some((status, message.into()));
    }

    pub fn add_file_node(&self, node_id: &str, name: &str) {
        self.file_nodes
            .lock()
            .unwrap()
            .insert(node_id.into(), name.into());
    }

    pub fn add_dev_resource(&self, id: &str, file_key: &str, node_id: &str, url: &str) {
        self.dev_resources.lock().unwrap().push(DevResource {
            id: Some(id.into()),
            name: "Linked issue".into(),
            url: url.into(),
            file_key: file_key.into(),
            node_id: node_id.into(),
        });
    }

    pub fn created_dev_resources(&self) -> Vec<DevResource> {
        self.created_dev_resources.lock().unwrap().clone()
    }

    pub fn deleted_dev_resources(&self) -> Vec<String> {
        self.deleted_dev_resources.lock().unwrap().clone()
    }

    pub fn created_webhook_requests(&self) -> Vec<CreateWebhookRequest> {
        self.webhook_requests.lock().unwrap().clone()
    }

    pub fn fail_webhook_creation(&self, status: u16, message: &str) {
        *self.webhook_creation_failure.lock().unwrap() = Some((status, message.into()));
    }

    pub fn fail_webhook_deletion(&self, webhook_id: &str) {
        self.failing_webhook_ids
            .lock()
            .unwrap()
            .insert(webhook_id.into());
    }

    pub fn deleted_webhooks(&self) -> Vec<String> {
        self.deleted_webhooks.lock().unwrap().clone()
    }

    pub fn set_team_name(&self, name: &str) {
        *self.team_name.lock().unwrap() = Some(name.into());
    }
}

fn api_error(failure: &Mutex<Option<(u16, String)>>) -> Option<FigmaError> {
    failure
        .lock()
        .unwrap()
        .as_ref()
        .map(|(status, message)| FigmaError::Api {
            status: *status,
            message: message.clone(),
        })
}

#[async_trait]
impl FigmaApi for MockFigmaApi {
    async fn get_oauth2_token(&self, code: &str) -> Result<FigmaOAuth2TokenResponse, FigmaError> {
        self.oauth2_token_calls.lock().unwrap().push(code.into());
        Ok(FigmaOAuth2TokenResponse {
            access_token: "figd_access".into(),
            refresh_token: "figr_refresh".into(),
            expires_in: 7_776_000,
        })
    }

    async fn refresh_oauth2_token(
        &self,
        _refresh_token: &str,
    ) -> Result<FigmaRefreshOAuth2TokenResponse, FigmaError> {
        *self.refresh_calls.lock().unwrap() += 1;
        if let Some(err) = api_error(&self.refresh_failure) {
            return Err(err);
        }
        Ok(FigmaRefreshOAuth2TokenResponse {
            access_token: "figd_refreshed".into(),
            refresh_token: None,
            expires_in: 7_776_000,
        })
    }

    async fn me(&self, _access_token: &str) -> Result<FigmaUser, FigmaError> {
        if let Some(err) = api_error(&self.me_failure) {
            return Err(err);
        }
        Ok(FigmaUser {
            id: "figma-user-1".into(),
            email: "designer@example.com".into(),
            handle: "designer".into(),
        })
    }

    async fn get_file(
        &self,
        _file_key: &str,
        _access_token: &str,
    ) -> Result<FigmaFile, FigmaError> {
        Ok(FigmaFile {
            name: "Checkout Flow".into(),
            last_modified: "2024-02-01T10:00:00Z".into(),
            version: "42".into(),
            editor_type: Some("figma".into()),
        })
    }

    async fn get_file_nodes(
        &self,
        _file_key: &str,
        node_id: &str,
        _access_token: &str,
    ) -> Result<FigmaFileNodesResponse, FigmaError> {
        let mut nodes = HashMap::new();
        if let Some(name) = self.file_nodes.lock().unwrap().get(node_id) {
            nodes.insert(
                node_id.to_string(),
                FigmaFileNode {
                    document: FigmaNodeDocument {
                        id: node_id.to_string(),
                        name: name.clone(),
                        node_type: "FRAME".into(),
                    },
                },
            );
        }
        Ok(FigmaFileNodesResponse {
            name: "Checkout Flow".into(),
            last_modified: "2024-02-01T10:00:00Z".into(),
            version: "42".into(),
            nodes,
        })
    }

    async fn create_dev_resources(
        &self,
        resources: Vec<DevResource>,
        _access_token: &str,
    ) -> Result<CreateDevResourcesResponse, FigmaError> {
        self.created_dev_resources
            .lock()
            .unwrap()
            .extend(resources.clone());
        Ok(CreateDevResourcesResponse {
            links_created: resources,
            errors: Vec::new(),
        })
    }

    async fn get_dev_resources(
        &self,
        file_key: &str,
        node_id: &str,
        _access_token: &str,
    ) -> Result<Vec<DevResource>, FigmaError> {
        Ok(self
            .dev_resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.file_key == file_key && r.node_id == node_id)
            .cloned()
            .collect())
    }

    async fn delete_dev_resource(
        &self,
        _file_key: &str,
        dev_resource_id: &str,
        _access_token: &str,
    ) -> Result<(), FigmaError> {
        self.deleted_dev_resources
            .lock()
            .unwrap()
            .push(dev_resource_id.into());
        Ok(())
    }

    async fn create_webhook(
        &self,
        request: CreateWebhookRequest,
        _access_token: &str,
    ) -> Result<FigmaWebhook, FigmaError> {
        if let Some(err) = api_error(&self.webhook_creation_failure) {
            return Err(err);
        }
        let webhook = FigmaWebhook {
            id: format!("webhook-{}", self.webhook_requests.lock().unwrap().len() + 1),
            team_id: request.team_id.clone(),
            event_type: request.event_type.clone(),
            endpoint: request.endpoint.clone(),
        };
        self.webhook_requests.lock().unwrap().push(request);
        Ok(webhook)
    }

    async fn delete_webhook(
        &self,
        webhook_id: &str,
        _access_token: &str,
    ) -> Result<(), FigmaError> {
        if self.failing_webhook_ids.lock().unwrap().contains(webhook_id) {
            return Err(FigmaError::Api {
                status: 500,
                message: "Internal error".into(),
            });
        }
        self.deleted_webhooks.lock().unwrap().push(webhook_id.into());
        Ok(())
    }

    async fn get_team_projects(
        &self,
        _team_id: &str,
        _access_token: &str,
    ) -> Result<FigmaTeamProjectsResponse, FigmaError> {
        Ok(FigmaTeamProjectsResponse {
            name: self
                .team_name
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "Design Team".into()),
            projects: Vec::new(),
        })
    }
}

/// Recording double for the Jira REST API.
pub struct MockJiraApi {
    submitted: Mutex<Vec<DesignSubmission>>,
    rejection: Mutex<Option<RejectedDesign>>,
    unknown_issue_key: Mutex<Option<String>>,
    issue_properties: Mutex<HashMap<(String, String), serde_json::Value>>,
    property_writes_fail: Mutex<bool>,
    app_properties: Mutex<HashMap<String, serde_json::Value>>,
    admin: Mutex<bool>,
}

impl Default for MockJiraApi {
    fn default() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            rejection: Mutex::new(None),
            unknown_issue_key: Mutex::new(None),
            issue_properties: Mutex::new(HashMap::new()),
            property_writes_fail: Mutex::new(false),
            app_properties: Mutex::new(HashMap::new()),
            admin: Mutex::new(true),
        }
    }
}

impl MockJiraApi {
    pub fn submitted_designs(&self) -> Vec<DesignSubmission> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn reject_next_submission(&self, design_id: &str, message: &str) {
        *self.rejection.lock().unwrap() = Some(RejectedDesign {
            key: crate::jira::types::DesignKey {
                design_id: design_id.into(),
            },
            errors: vec![RejectionError {
                message: message.into(),
            }],
        });
    }

    pub fn mark_next_submission_unknown_issue_key(&self, issue_key: &str) {
        *self.unknown_issue_key.lock().unwrap() = Some(issue_key.into());
    }

    pub fn issue_property(&self, issue: &str, key: &str) -> Option<serde_json::Value> {
        self.issue_properties
            .lock()
            .unwrap()
            .get(&(issue.to_string(), key.to_string()))
            .cloned()
    }

    pub fn app_property(&self, key: &str) -> Option<serde_json::Value> {
        self.app_properties.lock().unwrap().get(key).cloned()
    }

    pub fn set_admin(&self, admin: bool) {
        *self.admin.lock().unwrap() = admin;
    }

    pub fn fail_property_writes(&self) {
        *self.property_writes_fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl JiraApi for MockJiraApi {
    async fn submit_designs(
        &self,
        request: SubmitDesignsRequest,
        _installation: &ConnectInstallation,
    ) -> Result<SubmitDesignsResponse, JiraError> {
        let accepted = request
            .designs
            .iter()
            .map(|submission| crate::jira::types::DesignKey {
                design_id: submission.design.id.clone(),
            })
            .collect();
        self.submitted.lock().unwrap().extend(request.designs);

        if let Some(rejected) = self.rejection.lock().unwrap().take() {
            return Ok(SubmitDesignsResponse {
                accepted_entities: Vec::new(),
                rejected_entities: vec![rejected],
                unknown_issue_keys: None,
                unknown_associations: None,
            });
        }
        if let Some(key) = self.unknown_issue_key.lock().unwrap().take() {
            return Ok(SubmitDesignsResponse {
                accepted_entities: Vec::new(),
                rejected_entities: Vec::new(),
                unknown_issue_keys: Some(vec![key]),
                unknown_associations: None,
            });
        }

        Ok(SubmitDesignsResponse {
            accepted_entities: accepted,
            rejected_entities: Vec::new(),
            unknown_issue_keys: None,
            unknown_associations: None,
        })
    }

    async fn get_issue(
        &self,
        issue_id_or_key: &str,
        _installation: &ConnectInstallation,
    ) -> Result<JiraIssue, JiraError> {
        Ok(JiraIssue {
            id: "10001".into(),
            key: if issue_id_or_key.contains('-') {
                issue_id_or_key.to_string()
            } else {
                "TEST-1".into()
            },
            fields: JiraIssueFields {
                summary: "Fix checkout".into(),
            },
        })
    }

    async fn get_issue_property(
        &self,
        issue_id_or_key: &str,
        property_key: &str,
        _installation: &ConnectInstallation,
    ) -> Result<IssueProperty, JiraError> {
        self.issue_properties
            .lock()
            .unwrap()
            .get(&(issue_id_or_key.to_string(), property_key.to_string()))
            .map(|value| IssueProperty {
                key: property_key.to_string(),
                value: value.clone(),
            })
            .ok_or(JiraError::NotFound)
    }

    async fn set_issue_property(
        &self,
        issue_id_or_key: &str,
        property_key: &str,
        value: serde_json::Value,
        _installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        if *self.property_writes_fail.lock().unwrap() {
            return Err(JiraError::Api {
                status: 500,
                message: "Internal error".into(),
            });
        }
        self.issue_properties
            .lock()
            .unwrap()
            .insert((issue_id_or_key.to_string(), property_key.to_string()), value);
        Ok(())
    }

    async fn delete_issue_property(
        &self,
        issue_id_or_key: &str,
        property_key: &str,
        _installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        self.issue_properties
            .lock()
            .unwrap()
            .remove(&(issue_id_or_key.to_string(), property_key.to_string()));
        Ok(())
    }

    async fn check_permissions(
        &self,
        request: CheckPermissionsRequest,
        _installation: &ConnectInstallation,
    ) -> Result<CheckPermissionsResponse, JiraError> {
        let granted = if *self.admin.lock().unwrap() {
            request.global_permissions
        } else {
            Vec::new()
        };
        Ok(CheckPermissionsResponse {
            global_permissions: granted,
        })
    }

    async fn set_app_property(
        &self,
        property_key: &str,
        value: serde_json::Value,
        _installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        self.app_properties
            .lock()
            .unwrap()
            .insert(property_key.to_string(), value);
        Ok(())
    }
}

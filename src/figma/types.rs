//! Figma REST API request/response shapes.
//!
//! Each response body is deserialized against one of these declared shapes;
//! a body that does not match fails with a structured error instead of
//! propagating malformed data further in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct FigmaOAuth2TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigmaRefreshOAuth2TokenResponse {
    pub access_token: String,
    /// Present when the provider rotates the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigmaUser {
    pub id: String,
    pub email: String,
    pub handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaFile {
    pub name: String,
    pub last_modified: String,
    pub version: String,
    #[serde(default)]
    pub editor_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigmaNodeDocument {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigmaFileNode {
    pub document: FigmaNodeDocument,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaFileNodesResponse {
    pub name: String,
    pub last_modified: String,
    pub version: String,
    pub nodes: std::collections::HashMap<String, FigmaFileNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevResource {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    pub file_key: String,
    pub node_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevResourceError {
    #[serde(default)]
    pub file_key: Option<String>,
    #[serde(default)]
    pub node_id: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDevResourcesResponse {
    #[serde(default)]
    pub links_created: Vec<DevResource>,
    #[serde(default)]
    pub errors: Vec<DevResourceError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetDevResourcesResponse {
    pub dev_resources: Vec<DevResource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWebhookRequest {
    pub event_type: String,
    pub team_id: String,
    pub endpoint: String,
    pub passcode: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigmaWebhook {
    pub id: String,
    pub team_id: String,
    pub event_type: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigmaTeamProject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigmaTeamProjectsResponse {
    pub name: String,
    #[serde(default)]
    pub projects: Vec<FigmaTeamProject>,
}

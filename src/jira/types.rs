//! Jira REST API request/response shapes.

use serde::{Deserialize, Serialize};

use crate::models::{AtlassianAssociation, AtlassianDesign};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraIssueFields {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
    pub fields: JiraIssueFields,
}

/// One design entry of a bulk submission: the design metadata plus the
/// association changes and the conflict-resolution stamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSubmission {
    #[serde(flatten)]
    pub design: AtlassianDesign,
    pub add_associations: Option<Vec<AtlassianAssociation>>,
    pub remove_associations: Option<Vec<AtlassianAssociation>>,
    pub associations_last_updated: String,
    pub associations_update_sequence_number: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitDesignsRequest {
    pub designs: Vec<DesignSubmission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignKey {
    pub design_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedDesign {
    pub key: DesignKey,
    pub errors: Vec<RejectionError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDesignsResponse {
    #[serde(default)]
    pub accepted_entities: Vec<DesignKey>,
    #[serde(default)]
    pub rejected_entities: Vec<RejectedDesign>,
    #[serde(default)]
    pub unknown_issue_keys: Option<Vec<String>>,
    #[serde(default)]
    pub unknown_associations: Option<Vec<AtlassianAssociation>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueProperty {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPermissionsRequest {
    pub account_id: String,
    pub global_permissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPermissionsResponse {
    #[serde(default)]
    pub global_permissions: Vec<String>,
}

/// Entry of the `attached-design-url-v2` issue property array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedDesignUrlV2Value {
    pub url: String,
    pub name: String,
}

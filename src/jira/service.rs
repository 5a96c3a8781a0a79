//! Design submission service on top of the Jira REST client.
//!
//! `submit_design` is the authoritative write: rejection there means the
//! association never happened. The issue-property writes are best-effort
//! mirrors kept for backwards compatibility with earlier integrations that
//! read `attached-design-url` / `attached-design-url-v2`.

use std::sync::Arc;

use tracing::warn;

use super::client::JiraApi;
use super::types::{
    AttachedDesignUrlV2Value, CheckPermissionsRequest, DesignSubmission, JiraIssue,
    SubmitDesignsRequest,
};
use super::JiraError;
use crate::clock::Clock;
use crate::db::schema::ConnectInstallation;
use crate::models::{AtlassianAssociation, AtlassianDesign, FigmaDesignIdentifier};

const ATTACHED_DESIGN_URL_KEY: &str = "attached-design-url";
const ATTACHED_DESIGN_URL_V2_KEY: &str = "attached-design-url-v2";

/// Value stored under the `is-configured` app property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationStatus {
    Configured,
    NotConfigured,
}

impl ConfigurationStatus {
    fn as_str(self) -> &'static str {
        match self {
            ConfigurationStatus::Configured => "CONFIGURED",
            ConfigurationStatus::NotConfigured => "NOT_CONFIGURED",
        }
    }
}

pub fn build_issue_url(jira_base_url: &str, issue_key: &str) -> String {
    format!("{}/browse/{issue_key}", jira_base_url.trim_end_matches('/'))
}

pub struct JiraService {
    api: Arc<dyn JiraApi>,
    clock: Arc<dyn Clock>,
}

impl JiraService {
    pub fn new(api: Arc<dyn JiraApi>, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    /// Submits a design with its association changes. Any rejection or
    /// unknown entity in the response is treated as a failure of the whole
    /// submission.
    pub async fn submit_design(
        &self,
        design: AtlassianDesign,
        add_associations: Option<Vec<AtlassianAssociation>>,
        remove_associations: Option<Vec<AtlassianAssociation>>,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        let now = self.clock.now();
        let design_id = design.id.clone();
        let submission = DesignSubmission {
            design,
            add_associations,
            remove_associations,
            associations_last_updated: now.to_rfc3339(),
            associations_update_sequence_number: now.timestamp_millis(),
        };

        let response = self
            .api
            .submit_designs(
                SubmitDesignsRequest {
                    designs: vec![submission],
                },
                installation,
            )
            .await?;

        let mut reasons: Vec<String> = response
            .rejected_entities
            .iter()
            .flat_map(|rejected| rejected.errors.iter().map(|e| e.message.clone()))
            .collect();
        if let Some(keys) = &response.unknown_issue_keys {
            for key in keys {
                reasons.push(format!("Unknown issue key: {key}"));
            }
        }
        if let Some(associations) = &response.unknown_associations {
            if !associations.is_empty() {
                reasons.push("Unknown association".to_string());
            }
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(JiraError::SubmitDesignRejected { design_id, reasons })
        }
    }

    pub async fn get_issue(
        &self,
        issue_id_or_key: &str,
        installation: &ConnectInstallation,
    ) -> Result<JiraIssue, JiraError> {
        self.api.get_issue(issue_id_or_key, installation).await
    }

    /// Mirrors the design URL into the legacy issue properties.
    pub async fn save_design_url_in_issue_properties(
        &self,
        issue_id_or_key: &str,
        design_url: &str,
        design_display_name: &str,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        self.set_attached_design_url_if_missing(issue_id_or_key, design_url, installation)
            .await?;
        self.append_attached_design_url_v2(
            issue_id_or_key,
            design_url,
            design_display_name,
            installation,
        )
        .await
    }

    /// Removes the design URL from the legacy issue properties. A property
    /// that was never set is not an error.
    pub async fn delete_design_url_from_issue_properties(
        &self,
        issue_id_or_key: &str,
        design_url: &str,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        self.delete_attached_design_url_if_matches(issue_id_or_key, design_url, installation)
            .await?;
        self.remove_attached_design_url_v2(issue_id_or_key, design_url, installation)
            .await
    }

    /// The legacy single-URL property is only written when absent, so the
    /// first attached design wins.
    async fn set_attached_design_url_if_missing(
        &self,
        issue_id_or_key: &str,
        design_url: &str,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        match self
            .api
            .get_issue_property(issue_id_or_key, ATTACHED_DESIGN_URL_KEY, installation)
            .await
        {
            Ok(_) => Ok(()),
            Err(JiraError::NotFound) => {
                self.api
                    .set_issue_property(
                        issue_id_or_key,
                        ATTACHED_DESIGN_URL_KEY,
                        serde_json::Value::String(design_url.to_string()),
                        installation,
                    )
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_attached_design_url_if_matches(
        &self,
        issue_id_or_key: &str,
        design_url: &str,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        match self
            .api
            .get_issue_property(issue_id_or_key, ATTACHED_DESIGN_URL_KEY, installation)
            .await
        {
            Ok(property) => {
                if property.value.as_str() == Some(design_url) {
                    self.api
                        .delete_issue_property(
                            issue_id_or_key,
                            ATTACHED_DESIGN_URL_KEY,
                            installation,
                        )
                        .await?;
                }
                Ok(())
            }
            Err(JiraError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Appends to the v2 property unless an entry for the same design is
    /// already there. The property value is a JSON string containing a JSON
    /// array, so it is parsed and re-serialized through two layers.
    async fn append_attached_design_url_v2(
        &self,
        issue_id_or_key: &str,
        design_url: &str,
        design_display_name: &str,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        let mut entries = match self
            .api
            .get_issue_property(issue_id_or_key, ATTACHED_DESIGN_URL_V2_KEY, installation)
            .await
        {
            Ok(property) => parse_attached_design_url_v2(&property.value),
            Err(JiraError::NotFound) => Vec::new(),
            Err(e) => return Err(e),
        };

        if entries
            .iter()
            .any(|entry| design_urls_match(&entry.url, design_url))
        {
            return Ok(());
        }

        entries.push(AttachedDesignUrlV2Value {
            url: design_url.to_string(),
            name: design_display_name.to_string(),
        });
        self.set_attached_design_url_v2(issue_id_or_key, &entries, installation)
            .await
    }

    async fn remove_attached_design_url_v2(
        &self,
        issue_id_or_key: &str,
        design_url: &str,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        let entries = match self
            .api
            .get_issue_property(issue_id_or_key, ATTACHED_DESIGN_URL_V2_KEY, installation)
            .await
        {
            Ok(property) => parse_attached_design_url_v2(&property.value),
            Err(JiraError::NotFound) => return Ok(()),
            Err(e) => return Err(e),
        };

        let remaining: Vec<AttachedDesignUrlV2Value> = entries
            .iter()
            .filter(|entry| !design_urls_match(&entry.url, design_url))
            .cloned()
            .collect();

        if remaining.len() == entries.len() {
            warn!(issue = issue_id_or_key, "No matching design URL to remove");
            return Ok(());
        }

        self.set_attached_design_url_v2(issue_id_or_key, &remaining, installation)
            .await
    }

    async fn set_attached_design_url_v2(
        &self,
        issue_id_or_key: &str,
        entries: &[AttachedDesignUrlV2Value],
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        let inner = serde_json::to_string(entries)
            .map_err(|e| JiraError::UnexpectedResponse(e.to_string()))?;
        self.api
            .set_issue_property(
                issue_id_or_key,
                ATTACHED_DESIGN_URL_V2_KEY,
                serde_json::Value::String(inner),
                installation,
            )
            .await
    }

    /// Checks whether the user holds the ADMINISTER global permission.
    pub async fn is_admin(
        &self,
        atlassian_user_id: &str,
        installation: &ConnectInstallation,
    ) -> Result<bool, JiraError> {
        let response = self
            .api
            .check_permissions(
                CheckPermissionsRequest {
                    account_id: atlassian_user_id.to_string(),
                    global_permissions: vec!["ADMINISTER".to_string()],
                },
                installation,
            )
            .await?;
        Ok(response
            .global_permissions
            .iter()
            .any(|p| p == "ADMINISTER"))
    }

    /// Records whether the installation has at least one connected team, so
    /// Jira can surface the app's configuration state.
    pub async fn set_app_configuration_status(
        &self,
        status: ConfigurationStatus,
        installation: &ConnectInstallation,
    ) -> Result<(), JiraError> {
        self.api
            .set_app_property(
                "is-configured",
                serde_json::Value::String(status.as_str().to_string()),
                installation,
            )
            .await
    }
}

fn parse_attached_design_url_v2(value: &serde_json::Value) -> Vec<AttachedDesignUrlV2Value> {
    let Some(inner) = value.as_str() else {
        return Vec::new();
    };
    serde_json::from_str(inner).unwrap_or_default()
}

/// Compares two design URLs by the design they identify, falling back to
/// string equality for URLs that do not parse as Figma design links.
fn design_urls_match(a: &str, b: &str) -> bool {
    let parsed_a = reqwest::Url::parse(a)
        .ok()
        .and_then(|u| FigmaDesignIdentifier::from_figma_design_url(&u).ok());
    let parsed_b = reqwest::Url::parse(b)
        .ok()
        .and_then(|u| FigmaDesignIdentifier::from_figma_design_url(&u).ok());
    match (parsed_a, parsed_b) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

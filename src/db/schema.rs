//! Persisted domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per Jira site that installed the app.
///
/// `shared_secret` is the symmetric signing key for this tenant and must
/// never leave the trust boundary.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ConnectInstallation {
    pub id: String,
    pub key: String,
    pub client_key: String,
    pub shared_secret: String,
    pub base_url: String,
    pub display_url: String,
}

#[derive(Debug, Clone)]
pub struct ConnectInstallationCreateParams {
    pub key: String,
    pub client_key: String,
    pub shared_secret: String,
    pub base_url: String,
    pub display_url: String,
}

/// Identifies an Atlassian user within a specific installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectUserInfo {
    pub atlassian_user_id: String,
    pub connect_installation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FigmaOAuth2UserCredentials {
    pub id: String,
    pub atlassian_user_id: String,
    pub connect_installation_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry as a Unix timestamp (seconds).
    pub expires_at: i64,
}

impl FigmaOAuth2UserCredentials {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct FigmaOAuth2UserCredentialsCreateParams {
    pub atlassian_user_id: String,
    pub connect_installation_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum FigmaTeamAuthStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FigmaTeam {
    pub id: String,
    pub team_id: String,
    pub team_name: String,
    pub webhook_id: String,
    pub webhook_passcode: String,
    /// The user whose Figma credentials back the team webhook.
    pub figma_admin_atlassian_user_id: String,
    pub auth_status: FigmaTeamAuthStatus,
    pub connect_installation_id: String,
}

impl FigmaTeam {
    pub fn admin_info(&self) -> ConnectUserInfo {
        ConnectUserInfo {
            atlassian_user_id: self.figma_admin_atlassian_user_id.clone(),
            connect_installation_id: self.connect_installation_id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FigmaTeamCreateParams {
    pub team_id: String,
    pub team_name: String,
    pub webhook_id: String,
    pub webhook_passcode: String,
    pub figma_admin_atlassian_user_id: String,
    pub auth_status: FigmaTeamAuthStatus,
    pub connect_installation_id: String,
}

/// Team projection returned to the admin UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaTeamSummary {
    pub team_id: String,
    pub team_name: String,
    pub auth_status: FigmaTeamAuthStatus,
}

impl From<&FigmaTeam> for FigmaTeamSummary {
    fn from(team: &FigmaTeam) -> Self {
        Self {
            team_id: team.team_id.clone(),
            team_name: team.team_name.clone(),
            auth_status: team.auth_status,
        }
    }
}

/// Record of a design linked to an Atlassian entity.
///
/// Upserted only after the remote Jira submission succeeded.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AssociatedFigmaDesign {
    pub id: String,
    pub file_key: String,
    pub node_id: Option<String>,
    pub associated_with_ari: String,
    pub connect_installation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedFigmaDesignCreateParams {
    pub file_key: String,
    pub node_id: Option<String>,
    pub associated_with_ari: String,
    pub connect_installation_id: String,
}

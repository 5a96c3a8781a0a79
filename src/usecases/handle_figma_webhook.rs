//! Inbound Figma webhook handling.
//!
//! Deliveries are authenticated by recomputing the passcode from the stored
//! team binding; anything that fails that check is rejected before any event
//! processing. `FILE_UPDATE` deliveries probe the team admin's credentials
//! and, when those are healthy, re-submit every design recorded for the
//! updated file so Jira's copy of the metadata stays current.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::passcode::validate_webhook_passcode;
use crate::db::repositories::{
    AssociatedFigmaDesignRepository, ConnectInstallationRepository, FigmaTeamRepository,
};
use crate::db::schema::{ConnectInstallation, FigmaTeam, FigmaTeamAuthStatus};
use crate::errors::UseCaseError;
use crate::figma::FigmaService;
use crate::jira::JiraService;
use crate::models::FigmaDesignIdentifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FigmaWebhookEventType {
    Ping,
    FileUpdate,
    FileVersionUpdate,
    FileDelete,
    LibraryPublish,
    FileComment,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigmaWebhookEventPayload {
    pub event_type: FigmaWebhookEventType,
    pub webhook_id: String,
    pub passcode: String,
    #[serde(default)]
    pub file_key: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

pub struct HandleFigmaWebhookUseCase {
    teams: Arc<dyn FigmaTeamRepository>,
    installations: Arc<dyn ConnectInstallationRepository>,
    associated_designs: Arc<dyn AssociatedFigmaDesignRepository>,
    figma: Arc<FigmaService>,
    jira: Arc<JiraService>,
}

impl HandleFigmaWebhookUseCase {
    pub fn new(
        teams: Arc<dyn FigmaTeamRepository>,
        installations: Arc<dyn ConnectInstallationRepository>,
        associated_designs: Arc<dyn AssociatedFigmaDesignRepository>,
        figma: Arc<FigmaService>,
        jira: Arc<JiraService>,
    ) -> Self {
        Self {
            teams,
            installations,
            associated_designs,
            figma,
            jira,
        }
    }

    pub async fn execute(&self, payload: FigmaWebhookEventPayload) -> Result<(), UseCaseError> {
        let team = self
            .teams
            .get_by_webhook_id(&payload.webhook_id)
            .await?
            .ok_or_else(|| {
                UseCaseError::NotFound(format!("Unknown webhook: {}", payload.webhook_id))
            })?;

        let installation = self
            .installations
            .get(&team.connect_installation_id)
            .await?
            .ok_or_else(|| {
                UseCaseError::NotFound(format!(
                    "Unknown tenant: {}",
                    team.connect_installation_id
                ))
            })?;

        if !validate_webhook_passcode(
            &payload.passcode,
            &team.figma_admin_atlassian_user_id,
            &team.team_id,
            &installation.shared_secret,
        ) {
            return Err(UseCaseError::BadRequest("Invalid passcode".into()));
        }

        // Every event type except PING identifies the file it is about.
        if payload.event_type != FigmaWebhookEventType::Ping
            && (payload.file_key.is_none() || payload.file_name.is_none())
        {
            return Err(UseCaseError::BadRequest(
                "file_key and file_name are required for this event type".into(),
            ));
        }

        match payload.event_type {
            FigmaWebhookEventType::Ping => Ok(()),
            FigmaWebhookEventType::FileUpdate => {
                // The admin's credentials back this webhook; record whether
                // they still work so the UI can prompt a reconnect.
                let authorized = self.figma.check_auth(&team.admin_info()).await?;
                let status = if authorized {
                    FigmaTeamAuthStatus::Ok
                } else {
                    warn!(
                        team_id = %team.team_id,
                        "Team admin's Figma credentials no longer work"
                    );
                    FigmaTeamAuthStatus::Error
                };
                if status != team.auth_status {
                    self.teams.update_auth_status(&team.id, status).await?;
                }
                if !authorized {
                    return Ok(());
                }

                let file_key = payload.file_key.as_deref().unwrap_or_default();
                self.refresh_associated_designs(file_key, &team, &installation)
                    .await?;
                info!(
                    team_id = %team.team_id,
                    file_key,
                    "Processed file update event"
                );
                Ok(())
            }
            // Events the app does not subscribe to are acknowledged so Figma
            // does not retry them.
            _ => Ok(()),
        }
    }

    /// Re-fetches every design recorded for the file and submits the fresh
    /// metadata to Jira, without touching the associations.
    async fn refresh_associated_designs(
        &self,
        file_key: &str,
        team: &FigmaTeam,
        installation: &ConnectInstallation,
    ) -> Result<(), UseCaseError> {
        let associations = self
            .associated_designs
            .find_many_by_file_key_and_installation_id(file_key, &installation.id)
            .await?;

        let admin = team.admin_info();
        for association in associations {
            let design_id =
                FigmaDesignIdentifier::new(association.file_key, association.node_id);
            let design = self.figma.fetch_design(&design_id, &admin).await?;
            self.jira
                .submit_design(design, None, None, installation)
                .await?;
        }
        Ok(())
    }
}

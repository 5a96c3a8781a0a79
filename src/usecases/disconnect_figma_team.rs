//! Disconnect a Figma team from an installation.

use std::sync::Arc;

use tracing::info;

use crate::db::repositories::FigmaTeamRepository;
use crate::db::schema::ConnectInstallation;
use crate::errors::UseCaseError;
use crate::figma::FigmaService;
use crate::jira::{ConfigurationStatus, JiraService};

pub struct DisconnectFigmaTeamUseCase {
    figma: Arc<FigmaService>,
    jira: Arc<JiraService>,
    teams: Arc<dyn FigmaTeamRepository>,
}

impl DisconnectFigmaTeamUseCase {
    pub fn new(
        figma: Arc<FigmaService>,
        jira: Arc<JiraService>,
        teams: Arc<dyn FigmaTeamRepository>,
    ) -> Self {
        Self { figma, jira, teams }
    }

    /// Removes the webhook (best-effort) and the stored binding. When the
    /// last team goes, the app reports itself unconfigured to Jira.
    pub async fn execute(
        &self,
        team_id: &str,
        atlassian_user_id: &str,
        installation: &ConnectInstallation,
    ) -> Result<(), UseCaseError> {
        if !self.jira.is_admin(atlassian_user_id, installation).await? {
            return Err(UseCaseError::Forbidden(
                "Only Jira administrators can disconnect teams".into(),
            ));
        }

        let team = self
            .teams
            .get_by_team_id_and_installation_id(team_id, &installation.id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Team not connected: {team_id}")))?;

        self.figma
            .try_delete_webhook(&team.webhook_id, &team.admin_info())
            .await;

        self.teams.delete(&team.id).await?;

        let remaining = self
            .teams
            .find_many_by_installation_id(&installation.id)
            .await?;
        if remaining.is_empty() {
            self.jira
                .set_app_configuration_status(ConfigurationStatus::NotConfigured, installation)
                .await?;
        }

        info!(team_id, client_key = %installation.client_key, "Figma team disconnected");
        Ok(())
    }
}

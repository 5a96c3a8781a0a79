//! Connect a Figma team to an installation.

use std::sync::Arc;

use tracing::info;

use crate::auth::passcode::generate_webhook_passcode;
use crate::db::repositories::FigmaTeamRepository;
use crate::db::schema::{
    ConnectInstallation, ConnectUserInfo, FigmaTeamAuthStatus, FigmaTeamCreateParams,
    FigmaTeamSummary,
};
use crate::errors::UseCaseError;
use crate::figma::FigmaService;
use crate::jira::{ConfigurationStatus, JiraService};

pub struct ConnectFigmaTeamUseCase {
    figma: Arc<FigmaService>,
    jira: Arc<JiraService>,
    teams: Arc<dyn FigmaTeamRepository>,
}

impl ConnectFigmaTeamUseCase {
    pub fn new(
        figma: Arc<FigmaService>,
        jira: Arc<JiraService>,
        teams: Arc<dyn FigmaTeamRepository>,
    ) -> Self {
        Self { figma, jira, teams }
    }

    /// Registers a `FILE_UPDATE` webhook for the team and stores the binding.
    /// The connecting user becomes the team's admin: their credentials back
    /// the webhook from here on.
    pub async fn execute(
        &self,
        team_id: &str,
        atlassian_user_id: &str,
        installation: &ConnectInstallation,
    ) -> Result<FigmaTeamSummary, UseCaseError> {
        if !self.jira.is_admin(atlassian_user_id, installation).await? {
            return Err(UseCaseError::Forbidden(
                "Only Jira administrators can connect teams".into(),
            ));
        }

        let user = ConnectUserInfo {
            atlassian_user_id: atlassian_user_id.to_string(),
            connect_installation_id: installation.id.clone(),
        };

        let team_name = self.figma.get_team_name(team_id, &user).await?;
        let passcode =
            generate_webhook_passcode(atlassian_user_id, team_id, &installation.shared_secret);
        let webhook = self
            .figma
            .create_file_update_webhook(team_id, &passcode, &user)
            .await?;

        let team = self
            .teams
            .upsert(FigmaTeamCreateParams {
                team_id: team_id.to_string(),
                team_name,
                webhook_id: webhook.id,
                webhook_passcode: passcode,
                figma_admin_atlassian_user_id: atlassian_user_id.to_string(),
                auth_status: FigmaTeamAuthStatus::Ok,
                connect_installation_id: installation.id.clone(),
            })
            .await?;

        self.jira
            .set_app_configuration_status(ConfigurationStatus::Configured, installation)
            .await?;

        info!(team_id, client_key = %installation.client_key, "Figma team connected");
        Ok(FigmaTeamSummary::from(&team))
    }
}

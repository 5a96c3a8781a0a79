//! List the Figma teams connected to an installation.

use std::sync::Arc;

use crate::db::repositories::FigmaTeamRepository;
use crate::db::schema::{ConnectInstallation, FigmaTeamSummary};
use crate::errors::UseCaseError;
use crate::jira::JiraService;

pub struct ListFigmaTeamsUseCase {
    jira: Arc<JiraService>,
    teams: Arc<dyn FigmaTeamRepository>,
}

impl ListFigmaTeamsUseCase {
    pub fn new(jira: Arc<JiraService>, teams: Arc<dyn FigmaTeamRepository>) -> Self {
        Self { jira, teams }
    }

    /// Team summaries for the admin UI. The team admin's user id and the
    /// webhook binding stay server-side; only id, name, and auth health
    /// leave the trust boundary.
    pub async fn execute(
        &self,
        atlassian_user_id: &str,
        installation: &ConnectInstallation,
    ) -> Result<Vec<FigmaTeamSummary>, UseCaseError> {
        if !self.jira.is_admin(atlassian_user_id, installation).await? {
            return Err(UseCaseError::Forbidden(
                "Only Jira administrators can list connected teams".into(),
            ));
        }

        let teams = self
            .teams
            .find_many_by_installation_id(&installation.id)
            .await?;
        Ok(teams.iter().map(FigmaTeamSummary::from).collect())
    }
}

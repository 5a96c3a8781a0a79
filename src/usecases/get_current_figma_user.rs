//! Resolve the Figma account a Jira user authorized.

use std::sync::Arc;

use crate::db::schema::{ConnectInstallation, ConnectUserInfo};
use crate::errors::UseCaseError;
use crate::figma::types::FigmaUser;
use crate::figma::FigmaService;

pub struct GetCurrentFigmaUserUseCase {
    figma: Arc<FigmaService>,
}

impl GetCurrentFigmaUserUseCase {
    pub fn new(figma: Arc<FigmaService>) -> Self {
        Self { figma }
    }

    /// A `Forbidden` result means the user must (re)authorize; the routing
    /// layer renders that the same way as a failed auth check.
    pub async fn execute(
        &self,
        atlassian_user_id: &str,
        installation: &ConnectInstallation,
    ) -> Result<FigmaUser, UseCaseError> {
        let user = ConnectUserInfo {
            atlassian_user_id: atlassian_user_id.to_string(),
            connect_installation_id: installation.id.clone(),
        };
        Ok(self.figma.get_current_user(&user).await?)
    }
}

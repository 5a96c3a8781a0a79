//! `uninstalled` lifecycle event: tear a tenant down.

use std::sync::Arc;

use futures::future::join_all;
use tracing::info;

use crate::db::repositories::{ConnectInstallationRepository, FigmaTeamRepository};
use crate::errors::UseCaseError;
use crate::figma::FigmaService;

pub struct UninstalledUseCase {
    installations: Arc<dyn ConnectInstallationRepository>,
    teams: Arc<dyn FigmaTeamRepository>,
    figma: Arc<FigmaService>,
}

impl UninstalledUseCase {
    pub fn new(
        installations: Arc<dyn ConnectInstallationRepository>,
        teams: Arc<dyn FigmaTeamRepository>,
        figma: Arc<FigmaService>,
    ) -> Self {
        Self {
            installations,
            teams,
            figma,
        }
    }

    /// Deletes the installation and everything hanging off it. Webhook
    /// removal is best-effort: the tenant is going away either way, and the
    /// admin's Figma credentials may already be revoked.
    pub async fn execute(&self, client_key: &str) -> Result<(), UseCaseError> {
        let installation = self
            .installations
            .get_by_client_key(client_key)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("Unknown tenant: {client_key}")))?;

        let teams = self
            .teams
            .find_many_by_installation_id(&installation.id)
            .await?;

        join_all(teams.iter().map(|team| async move {
            let admin = team.admin_info();
            self.figma
                .try_delete_webhook(&team.webhook_id, &admin)
                .await;
        }))
        .await;

        // Cascade removes teams, credentials and associated designs.
        self.installations.delete_by_client_key(client_key).await?;

        info!(client_key, "App uninstalled");
        Ok(())
    }
}

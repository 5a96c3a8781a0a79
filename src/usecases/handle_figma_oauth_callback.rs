//! OAuth 2.0 authorization callback.

use std::sync::Arc;

use tracing::info;

use crate::auth::FigmaAuthService;
use crate::db::repositories::ConnectInstallationRepository;
use crate::db::schema::ConnectUserInfo;
use crate::errors::UseCaseError;

pub struct HandleFigmaOAuthCallbackUseCase {
    auth: Arc<FigmaAuthService>,
    installations: Arc<dyn ConnectInstallationRepository>,
}

impl HandleFigmaOAuthCallbackUseCase {
    pub fn new(
        auth: Arc<FigmaAuthService>,
        installations: Arc<dyn ConnectInstallationRepository>,
    ) -> Self {
        Self {
            auth,
            installations,
        }
    }

    /// The `state` token is the only thing tying the callback to a user and
    /// tenant, so it is verified before the code is exchanged.
    pub async fn execute(&self, code: &str, state: &str) -> Result<(), UseCaseError> {
        let (atlassian_user_id, client_key) = self.auth.verify_oauth2_state(state)?;

        let installation = self
            .installations
            .get_by_client_key(&client_key)
            .await?
            .ok_or_else(|| {
                UseCaseError::Unauthorized(format!("Unknown tenant in state: {client_key}"))
            })?;

        self.auth
            .create_credentials(
                code,
                &ConnectUserInfo {
                    atlassian_user_id: atlassian_user_id.clone(),
                    connect_installation_id: installation.id,
                },
            )
            .await?;

        info!(atlassian_user_id = %atlassian_user_id, "Figma authorization completed");
        Ok(())
    }
}

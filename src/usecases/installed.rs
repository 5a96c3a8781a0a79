//! `installed` lifecycle event: register or refresh a tenant.

use std::sync::Arc;

use tracing::info;

use crate::db::repositories::ConnectInstallationRepository;
use crate::db::schema::{ConnectInstallation, ConnectInstallationCreateParams};
use crate::errors::UseCaseError;

/// Fields of the `installed` lifecycle payload the app keeps.
#[derive(Debug, Clone)]
pub struct InstalledParams {
    pub key: String,
    pub client_key: String,
    pub shared_secret: String,
    pub base_url: String,
    /// Absent for most sites; falls back to `base_url`.
    pub display_url: Option<String>,
}

pub struct InstalledUseCase {
    installations: Arc<dyn ConnectInstallationRepository>,
}

impl InstalledUseCase {
    pub fn new(installations: Arc<dyn ConnectInstallationRepository>) -> Self {
        Self { installations }
    }

    /// Upserts the installation. Reinstalls rotate the shared secret, so the
    /// stored row is always replaced with the latest payload.
    pub async fn execute(
        &self,
        params: InstalledParams,
    ) -> Result<ConnectInstallation, UseCaseError> {
        let display_url = params
            .display_url
            .unwrap_or_else(|| params.base_url.clone());

        let installation = self
            .installations
            .upsert(ConnectInstallationCreateParams {
                key: params.key,
                client_key: params.client_key,
                shared_secret: params.shared_secret,
                base_url: params.base_url,
                display_url,
            })
            .await?;

        info!(client_key = %installation.client_key, "App installed");
        Ok(installation)
    }
}

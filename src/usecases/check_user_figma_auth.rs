//! Check whether a user holds working Figma credentials.

use std::sync::Arc;

use reqwest::Url;

use crate::auth::FigmaAuthService;
use crate::db::schema::{ConnectInstallation, ConnectUserInfo};
use crate::errors::UseCaseError;
use crate::figma::FigmaService;

/// Endpoint the authorization flow redirects back to.
pub const OAUTH_CALLBACK_ENDPOINT: &str = "figma/oauth/callback";

#[derive(Debug, Clone)]
pub struct CheckAuthResult {
    pub authorized: bool,
    /// Where to send the user to (re)authorize; `None` when authorized.
    pub authorization_endpoint: Option<Url>,
}

pub struct CheckUserFigmaAuthUseCase {
    figma: Arc<FigmaService>,
    auth: Arc<FigmaAuthService>,
}

impl CheckUserFigmaAuthUseCase {
    pub fn new(figma: Arc<FigmaService>, auth: Arc<FigmaAuthService>) -> Self {
        Self { figma, auth }
    }

    pub async fn execute(
        &self,
        atlassian_user_id: &str,
        installation: &ConnectInstallation,
    ) -> Result<CheckAuthResult, UseCaseError> {
        let user = ConnectUserInfo {
            atlassian_user_id: atlassian_user_id.to_string(),
            connect_installation_id: installation.id.clone(),
        };

        if self.figma.check_auth(&user).await? {
            return Ok(CheckAuthResult {
                authorized: true,
                authorization_endpoint: None,
            });
        }

        let endpoint = self.auth.build_authorization_endpoint(
            atlassian_user_id,
            installation,
            OAUTH_CALLBACK_ENDPOINT,
        )?;
        Ok(CheckAuthResult {
            authorized: false,
            authorization_endpoint: Some(endpoint),
        })
    }
}

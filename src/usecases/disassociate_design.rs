//! Remove the association between a Figma design and a Jira issue.

use std::sync::Arc;

use tracing::warn;

use crate::db::repositories::AssociatedFigmaDesignRepository;
use crate::db::schema::{
    AssociatedFigmaDesignCreateParams, ConnectInstallation, ConnectUserInfo,
};
use crate::errors::UseCaseError;
use crate::figma::FigmaService;
use crate::jira::{build_issue_url, JiraService};
use crate::models::{AtlassianAssociation, AtlassianDesign, FigmaDesignIdentifier};

#[derive(Debug, Clone)]
pub struct DisassociateDesignParams {
    pub design_id: FigmaDesignIdentifier,
    pub issue_ari: String,
    pub issue_id: String,
    pub atlassian_user_id: String,
    pub connect_installation: ConnectInstallation,
}

pub struct DisassociateDesignUseCase {
    figma: Arc<FigmaService>,
    jira: Arc<JiraService>,
    associated_designs: Arc<dyn AssociatedFigmaDesignRepository>,
}

impl DisassociateDesignUseCase {
    pub fn new(
        figma: Arc<FigmaService>,
        jira: Arc<JiraService>,
        associated_designs: Arc<dyn AssociatedFigmaDesignRepository>,
    ) -> Self {
        Self {
            figma,
            jira,
            associated_designs,
        }
    }

    /// Mirror of the associate flow: Jira is the authoritative write, the
    /// property and dev resource cleanup are best-effort, and the local row
    /// is removed last.
    pub async fn execute(
        &self,
        params: DisassociateDesignParams,
    ) -> Result<AtlassianDesign, UseCaseError> {
        let installation = &params.connect_installation;
        let user = ConnectUserInfo {
            atlassian_user_id: params.atlassian_user_id.clone(),
            connect_installation_id: installation.id.clone(),
        };

        let (design, issue) = {
            let (design, issue) = tokio::join!(
                self.figma.fetch_design(&params.design_id, &user),
                self.jira.get_issue(&params.issue_id, installation),
            );
            (design?, issue?)
        };

        self.jira
            .submit_design(
                design.clone(),
                None,
                Some(vec![AtlassianAssociation::design_issue_association(
                    &params.issue_ari,
                )]),
                installation,
            )
            .await?;

        let issue_url = build_issue_url(&installation.base_url, &issue.key);
        let (property_result, dev_resource_result) = tokio::join!(
            self.jira
                .delete_design_url_from_issue_properties(&issue.id, &design.url, installation),
            self.figma
                .delete_dev_resource_if_exists(&params.design_id, &issue_url, &user),
        );
        if let Err(e) = property_result {
            warn!(issue_id = %issue.id, error = %e, "Failed to remove design URL from issue properties");
        }
        if let Err(e) = dev_resource_result {
            warn!(issue_id = %issue.id, error = %e, "Failed to delete dev resource");
        }

        self.associated_designs
            .delete(AssociatedFigmaDesignCreateParams {
                file_key: params.design_id.file_key.clone(),
                node_id: params.design_id.node_id.clone(),
                associated_with_ari: params.issue_ari,
                connect_installation_id: installation.id.clone(),
            })
            .await?;

        Ok(design)
    }
}

//! Associate a Figma design with a Jira issue.

use std::sync::Arc;

use reqwest::Url;
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
pub struct AssociateDesignParams {
    /// Design URL as pasted by the user.
    pub design_url: Url,
    /// ARI of the issue the design is linked to.
    pub issue_ari: String,
    pub issue_id: String,
    pub atlassian_user_id: String,
    pub connect_installation: ConnectInstallation,
}

pub struct AssociateDesignUseCase {
    figma: Arc<FigmaService>,
    jira: Arc<JiraService>,
    associated_designs: Arc<dyn AssociatedFigmaDesignRepository>,
}

impl AssociateDesignUseCase {
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

    /// The Jira submission is the authoritative write: the local association
    /// row is only recorded after Jira accepted the design. The issue
    /// property and dev resource are convenience mirrors whose failures are
    /// logged but do not fail the association.
    pub async fn execute(
        &self,
        params: AssociateDesignParams,
    ) -> Result<AtlassianDesign, UseCaseError> {
        let design_id = FigmaDesignIdentifier::from_figma_design_url(&params.design_url)
            .map_err(|e| UseCaseError::BadRequest(e.to_string()))?;
        let installation = &params.connect_installation;
        let user = ConnectUserInfo {
            atlassian_user_id: params.atlassian_user_id.clone(),
            connect_installation_id: installation.id.clone(),
        };

        let (design, issue) = {
            let (design, issue) = tokio::join!(
                self.figma.fetch_design(&design_id, &user),
                self.jira.get_issue(&params.issue_id, installation),
            );
            (design?, issue?)
        };

        self.jira
            .submit_design(
                design.clone(),
                Some(vec![AtlassianAssociation::design_issue_association(
                    &params.issue_ari,
                )]),
                None,
                installation,
            )
            .await?;

        let issue_url = build_issue_url(&installation.base_url, &issue.key);
        let dev_resource_name = format!("[{}] {}", issue.key, issue.fields.summary);
        let (property_result, dev_resource_result) = tokio::join!(
            self.jira.save_design_url_in_issue_properties(
                &issue.id,
                &design.url,
                &design.display_name,
                installation,
            ),
            self.figma
                .create_dev_resource(&design_id, &dev_resource_name, &issue_url, &user),
        );
        if let Err(e) = property_result {
            warn!(issue_id = %issue.id, error = %e, "Failed to mirror design URL into issue properties");
        }
        if let Err(e) = dev_resource_result {
            warn!(issue_id = %issue.id, error = %e, "Failed to create dev resource");
        }

        self.associated_designs
            .upsert(AssociatedFigmaDesignCreateParams {
                file_key: design_id.file_key.clone(),
                node_id: design_id.node_id.clone(),
                associated_with_ari: params.issue_ari,
                connect_installation_id: installation.id.clone(),
            })
            .await?;

        Ok(design)
    }
}

//! Domain values shared between the Figma and Jira sides of a sync.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node id a file-level design is submitted under.
pub const DEFAULT_FIGMA_FILE_NODE_ID: &str = "0:0";

#[derive(Error, Debug)]
#[error("Invalid Figma design URL: {0}")]
pub struct InvalidFigmaDesignUrlError(pub String);

/// Composite identifier of a Figma design: a file key plus an optional
/// node id for designs that point at a node within the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigmaDesignIdentifier {
    pub file_key: String,
    pub node_id: Option<String>,
}

impl FigmaDesignIdentifier {
    pub fn new(file_key: String, node_id: Option<String>) -> Self {
        Self { file_key, node_id }
    }

    /// Parses `figma.com/{file|design|proto|board}/<fileKey>/...` URLs.
    ///
    /// A `node-id` query parameter selects a node; Figma encodes `:` as `-`
    /// in URLs, so `1-2` is normalized back to `1:2`.
    pub fn from_figma_design_url(url: &Url) -> Result<Self, InvalidFigmaDesignUrlError> {
        let mut segments = url
            .path_segments()
            .ok_or_else(|| InvalidFigmaDesignUrlError(url.to_string()))?;

        let kind = segments
            .next()
            .ok_or_else(|| InvalidFigmaDesignUrlError(url.to_string()))?;
        if !matches!(kind, "file" | "design" | "proto" | "board") {
            return Err(InvalidFigmaDesignUrlError(url.to_string()));
        }

        let file_key = segments
            .next()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| InvalidFigmaDesignUrlError(url.to_string()))?
            .to_string();

        let node_id = url
            .query_pairs()
            .find(|(key, _)| key == "node-id")
            .map(|(_, value)| value.replace('-', ":"));

        Ok(Self { file_key, node_id })
    }

    pub fn node_id_or_default(&self) -> &str {
        self.node_id.as_deref().unwrap_or(DEFAULT_FIGMA_FILE_NODE_ID)
    }

    /// The design id submitted to Jira: `fileKey/nodeId`.
    pub fn to_atlassian_design_id(&self) -> String {
        format!("{}/{}", self.file_key, self.node_id_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AtlassianDesignStatus {
    Ready,
    Unknown,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AtlassianDesignType {
    File,
    Node,
    Prototype,
    Other,
}

/// Design metadata in the shape Jira's design-ingestion endpoint accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlassianDesign {
    pub id: String,
    pub display_name: String,
    pub url: String,
    pub live_embed_url: String,
    pub status: AtlassianDesignStatus,
    #[serde(rename = "type")]
    pub design_type: AtlassianDesignType,
    pub last_updated: String,
    pub update_sequence_number: i64,
}

/// A typed relationship between a design and an Atlassian entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlassianAssociation {
    pub association_type: String,
    pub values: Vec<String>,
}

impl AtlassianAssociation {
    /// Association linking a design to a Jira issue, addressed by its ARI.
    pub fn design_issue_association(issue_ari: &str) -> Self {
        Self {
            association_type: "issueIdOrKeys".to_string(),
            values: vec![issue_ari.to_string()],
        }
    }
}

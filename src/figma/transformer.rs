//! Mapping of Figma API responses onto the design shape Jira ingests.

use chrono::DateTime;
use reqwest::Url;

use super::types::{FigmaFile, FigmaFileNodesResponse};
use crate::models::{
    AtlassianDesign, AtlassianDesignStatus, AtlassianDesignType, FigmaDesignIdentifier,
};

/// Builds the `https://www.figma.com/...` URL a design is presented under.
pub fn build_design_url(base_url: &Url, design_id: &FigmaDesignIdentifier) -> String {
    let mut url = format!("{}file/{}", base_url, design_id.file_key);
    if let Some(node_id) = &design_id.node_id {
        url.push_str("?node-id=");
        url.push_str(&node_id.replace(':', "-"));
    }
    url
}

pub fn build_live_embed_url(design_url: &str) -> String {
    format!(
        "https://www.figma.com/embed?embed_host=figma-connect&url={}",
        urlencoding::encode(design_url)
    )
}

pub fn transform_file_to_atlassian_design(
    design_id: &FigmaDesignIdentifier,
    design_url: &str,
    file: &FigmaFile,
) -> AtlassianDesign {
    AtlassianDesign {
        id: design_id.to_atlassian_design_id(),
        display_name: file.name.clone(),
        url: design_url.to_string(),
        live_embed_url: build_live_embed_url(design_url),
        status: AtlassianDesignStatus::Unknown,
        design_type: AtlassianDesignType::File,
        last_updated: file.last_modified.clone(),
        update_sequence_number: update_sequence_number(&file.last_modified),
    }
}

pub fn transform_node_to_atlassian_design(
    design_id: &FigmaDesignIdentifier,
    design_url: &str,
    response: &FigmaFileNodesResponse,
) -> AtlassianDesign {
    let node_name = design_id
        .node_id
        .as_ref()
        .and_then(|node_id| response.nodes.get(node_id))
        .map(|node| node.document.name.clone())
        .unwrap_or_else(|| response.name.clone());

    AtlassianDesign {
        id: design_id.to_atlassian_design_id(),
        display_name: node_name,
        url: design_url.to_string(),
        live_embed_url: build_live_embed_url(design_url),
        status: AtlassianDesignStatus::Unknown,
        design_type: AtlassianDesignType::Node,
        last_updated: response.last_modified.clone(),
        update_sequence_number: update_sequence_number(&response.last_modified),
    }
}

/// Millisecond timestamp of the last modification; designs with a stale
/// sequence number are ignored by Jira's ingestion endpoint.
fn update_sequence_number(last_modified: &str) -> i64 {
    DateTime::parse_from_rfc3339(last_modified)
        .map(|instant| instant.timestamp_millis())
        .unwrap_or(0)
}

//! Jira collaborator: REST client signed with per-request Connect JWTs
//! and the design submission service on top of it.

pub mod client;
pub mod service;
pub mod types;

pub use client::{JiraApi, JiraClient};
pub use service::{build_issue_url, ConfigurationStatus, JiraService};

use thiserror::Error;

use crate::jwt::JwtError;

#[derive(Error, Debug)]
pub enum JiraError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Jira API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The requested entity (issue, property) does not exist.
    #[error("Not found")]
    NotFound,

    #[error("Unexpected Jira API response: {0}")]
    UnexpectedResponse(String),

    /// Jira refused the design submission; carries the rejection detail.
    #[error("Design submission rejected for {design_id}: {}", reasons.join("; "))]
    SubmitDesignRejected {
        design_id: String,
        reasons: Vec<String>,
    },

    #[error("JWT error: {0}")]
    Jwt(#[from] JwtError),
}

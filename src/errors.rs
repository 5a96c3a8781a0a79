//! Use case error taxonomy.
//!
//! Collaborator errors are folded into one enum whose variants map onto the
//! HTTP statuses the routing layer answers with. Token verification failures
//! are 401; missing or revoked Figma credentials are 403, which tells the
//! frontend to start the authorization flow.

use thiserror::Error;

use crate::auth::AuthError;
use crate::db::DbError;
use crate::figma::FigmaError;
use crate::jira::JiraError;
use crate::jwt::JwtError;

#[derive(Error, Debug)]
pub enum UseCaseError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Design submission rejected for {design_id}: {}", reasons.join("; "))]
    SubmitDesignRejected {
        design_id: String,
        reasons: Vec<String>,
    },

    #[error("Figma API error: {0}")]
    Figma(FigmaError),

    #[error("Jira API error: {0}")]
    Jira(JiraError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl UseCaseError {
    /// HTTP status the routing layer answers with.
    pub fn status(&self) -> u16 {
        match self {
            UseCaseError::BadRequest(_) => 400,
            UseCaseError::Unauthorized(_) => 401,
            UseCaseError::Forbidden(_) => 403,
            UseCaseError::NotFound(_) => 404,
            UseCaseError::SubmitDesignRejected { .. } => 422,
            UseCaseError::Figma(_) | UseCaseError::Jira(_) | UseCaseError::Database(_) => 500,
        }
    }
}

impl From<JwtError> for UseCaseError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Repository(inner) => UseCaseError::Database(inner),
            other => UseCaseError::Unauthorized(other.to_string()),
        }
    }
}

impl From<AuthError> for UseCaseError {
    fn from(e: AuthError) -> Self {
        match e {
            // Missing or revoked Figma credentials: the user must (re)authorize.
            AuthError::Unauthorized(reason) => UseCaseError::Forbidden(reason),
            AuthError::InvalidState(reason) => UseCaseError::Unauthorized(reason),
            AuthError::Figma(inner) => inner.into(),
            AuthError::Database(inner) => UseCaseError::Database(inner),
        }
    }
}

impl From<FigmaError> for UseCaseError {
    fn from(e: FigmaError) -> Self {
        match e {
            FigmaError::Forbidden(reason) => UseCaseError::Forbidden(reason),
            FigmaError::Database(inner) => UseCaseError::Database(inner),
            other => UseCaseError::Figma(other),
        }
    }
}

impl From<JiraError> for UseCaseError {
    fn from(e: JiraError) -> Self {
        match e {
            JiraError::NotFound => UseCaseError::NotFound("Jira entity not found".into()),
            JiraError::SubmitDesignRejected { design_id, reasons } => {
                UseCaseError::SubmitDesignRejected { design_id, reasons }
            }
            JiraError::Jwt(inner) => inner.into(),
            other => UseCaseError::Jira(other),
        }
    }
}

//! Figma collaborator: REST client, response mapping and design service

pub mod client;
pub mod service;
pub mod transformer;
pub mod types;

pub use client::{FigmaApi, FigmaClient};
pub use service::FigmaService;

use thiserror::Error;

use crate::db::DbError;

#[derive(Error, Debug)]
pub enum FigmaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Figma API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected Figma API response: {0}")]
    UnexpectedResponse(String),

    /// Figma authorization is missing, expired beyond refresh, or revoked.
    /// The caller must restart the OAuth 2.0 grant flow.
    #[error("Figma authorization required: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl FigmaError {
    /// Whether a provider response indicates the access token was rejected.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, FigmaError::Api { status: 401 | 403, .. })
    }
}

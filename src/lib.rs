//! Trust and synchronization core of a Jira Connect app that links Figma
//! designs to Jira issues.
//!
//! The crate authenticates inbound Connect JWTs ([`jwt`]), keeps per-user
//! Figma OAuth2 credentials valid ([`auth`]), authenticates inbound Figma
//! webhook deliveries ([`auth::passcode`]), and orchestrates the
//! associate/disassociate writes across both systems ([`usecases`]). The
//! HTTP routing layer, descriptor generation, and response rendering live
//! outside this crate; it exposes use cases, not handlers.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod errors;
pub mod figma;
pub mod jira;
pub mod jwt;
pub mod models;
pub mod usecases;

#[cfg(test)]
pub mod testing;

//! Application use cases.
//!
//! Each use case is a small struct holding the collaborator seams it needs
//! and exposing a single `execute`. Use cases assume the routing layer has
//! already authenticated the inbound request; they receive verified
//! installations and user identities, never raw tokens.

pub mod associate_design;
pub mod check_user_figma_auth;
pub mod connect_figma_team;
pub mod disassociate_design;
pub mod disconnect_figma_team;
pub mod get_current_figma_user;
pub mod handle_figma_oauth_callback;
pub mod handle_figma_webhook;
pub mod installed;
pub mod list_figma_teams;
pub mod uninstalled;

pub use associate_design::{AssociateDesignParams, AssociateDesignUseCase};
pub use check_user_figma_auth::{CheckAuthResult, CheckUserFigmaAuthUseCase};
pub use connect_figma_team::ConnectFigmaTeamUseCase;
pub use disassociate_design::{DisassociateDesignParams, DisassociateDesignUseCase};
pub use disconnect_figma_team::DisconnectFigmaTeamUseCase;
pub use get_current_figma_user::GetCurrentFigmaUserUseCase;
pub use handle_figma_oauth_callback::HandleFigmaOAuthCallbackUseCase;
pub use handle_figma_webhook::{
    FigmaWebhookEventPayload, FigmaWebhookEventType, HandleFigmaWebhookUseCase,
};
pub use installed::{InstalledParams, InstalledUseCase};
pub use list_figma_teams::ListFigmaTeamsUseCase;
pub use uninstalled::UninstalledUseCase;

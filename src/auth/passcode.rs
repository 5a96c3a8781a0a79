//! Webhook passcode scheme.
//!
//! Figma webhooks carry no signature header; instead the webhook is
//! registered with a passcode that Figma echoes back on every delivery.
//! The passcode is derived deterministically from the team binding and the
//! installation's shared secret, so it can be recomputed on receipt and
//! never needs independent storage or rotation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Derives the passcode for a `(user, team, installation)` binding.
pub fn generate_webhook_passcode(
    atlassian_user_id: &str,
    figma_team_id: &str,
    installation_shared_secret: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(atlassian_user_id.as_bytes());
    hasher.update(b":");
    hasher.update(figma_team_id.as_bytes());
    hasher.update(b":");
    hasher.update(installation_shared_secret.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Checks a passcode echoed back by Figma against the expected derivation.
pub fn validate_webhook_passcode(
    passcode: &str,
    atlassian_user_id: &str,
    figma_team_id: &str,
    installation_shared_secret: &str,
) -> bool {
    passcode
        == generate_webhook_passcode(atlassian_user_id, figma_team_id, installation_shared_secret)
}

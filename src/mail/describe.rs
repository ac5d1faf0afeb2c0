//! Human-readable rendering of delivery failures.

use std::error::Error as StdError;

/// Shown instead of the server's reply when SMTP authentication is rejected.
pub const AUTH_FAILED_MESSAGE: &str =
    "Authentication with the provided SMTP username and password failed";

/// SMTP reply code for "authentication credentials invalid" (RFC 4954).
const SMTP_AUTH_FAILED: &str = "535";

/// Marker error a [`Transport`](super::Transport) can return when the server
/// rejected the configured credentials.
#[derive(Debug, thiserror::Error)]
#[error("authentication failed: {0}")]
pub struct AuthenticationFailed(pub String);

/// Render an error and its `source()` chain, one line per error, outermost
/// first. An authentication failure ends the chain: the server's reply text
/// below it is not shown.
pub fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut lines = Vec::new();
    let mut current = Some(err);

    while let Some(e) = current {
        if is_auth_failure(e) {
            lines.push(AUTH_FAILED_MESSAGE.to_string());
            break;
        }
        lines.push(describe_one(e));
        current = e.source();
    }

    lines.join("\n")
}

fn describe_one(err: &(dyn StdError + 'static)) -> String {
    let text = err.to_string();
    if text.is_empty() {
        format!("{err:?}")
    } else {
        text
    }
}

fn is_auth_failure(err: &(dyn StdError + 'static)) -> bool {
    if err.is::<AuthenticationFailed>() {
        return true;
    }
    err.downcast_ref::<lettre::transport::smtp::Error>()
        .and_then(|e| e.status())
        .is_some_and(|code| code.to_string() == SMTP_AUTH_FAILED)
}

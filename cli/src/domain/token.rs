//! Access-token extraction from notebook server output.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)] // Pattern is a compile-time constant
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"token=([A-Za-z0-9_-]+)").expect("valid token pattern"));

/// Extract the first `token=<value>` from captured output.
///
/// Returns an empty string when no token is present.
#[must_use]
pub fn extract_access_token(output: &str) -> String {
    TOKEN_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Local URL of the tunnelled notebook endpoint.
#[must_use]
pub fn endpoint_url(port: u16, token: &str) -> String {
    if token.is_empty() {
        format!("http://localhost:{port}")
    } else {
        format!("http://localhost:{port}/?token={token}")
    }
}

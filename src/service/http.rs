//! HTTP client factory used by discovery, site probes and the fetch stage.

use crate::error::{AuditError, Result};
use reqwest::Client;
use std::time::Duration;

/// Descriptive client identifier sent with every request.
pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; TillitAudit/",
    env!("CARGO_PKG_VERSION"),
    "; site trust audit)"
);

/// Standard client: follows redirects, default timeout.
pub fn create_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AuditError::network(format!("failed to build HTTP client: {e}")))
}

/// Probe client: never follows redirects, so redirect-consistency checks can
/// observe the 3xx responses themselves.
pub fn create_probe_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| AuditError::network(format!("failed to build probe client: {e}")))
}

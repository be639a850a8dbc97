use anyhow::{Context, Result};
use std::time::Duration;

const USER_AGENT: &str = concat!("coinconv/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client.
///
/// `reqwest::Client` pools connections internally and is cheap to clone, so one
/// instance serves every request of the process.
pub fn http_client(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(request_timeout)
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .context("Failed to build HTTP client")
}

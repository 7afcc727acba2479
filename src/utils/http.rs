use std::time::Duration;

use reqwest::Client;

use crate::config::Config;

const USER_AGENT: &str = concat!("autofit/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for model calls, built once at start-up and cloned into the gateway.
/// Clones share one connection pool.
pub fn build_http_client(config: &Config) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(config.http_timeout_seconds.max(1)))
        .build()
}

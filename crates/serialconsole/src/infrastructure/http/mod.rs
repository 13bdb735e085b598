//! HTTP collaborators: the connect negotiation and the admin command channel.
//!
//! Both use one `reqwest::Client` each, built with the configured connect
//! timeout and rustls so no system OpenSSL is needed.

pub mod admin;
pub mod negotiator;

pub use admin::HttpAdminChannel;
pub use negotiator::HttpNegotiator;

use std::time::Duration;

/// Builds the shared client configuration.
pub(crate) fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("serialconsole/", env!("CARGO_PKG_VERSION")))
        .build()
}

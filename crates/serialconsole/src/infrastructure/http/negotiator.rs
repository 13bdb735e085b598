//! Connect negotiation: trades the bearer token for a websocket URL.
//!
//! The connect endpoint is asked once per attempt with an empty POST.  Only a
//! `200 OK` whose JSON body carries `connectionString` counts as success;
//! every other outcome becomes a [`ConnectError`] and the user is prompted to
//! retry.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, ORIGIN};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::ports::{ConnectError, ConnectionNegotiator};
use crate::domain::ConsoleConfig;

use super::build_client;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectResponse {
    connection_string: String,
}

/// [`ConnectionNegotiator`] backed by the serial console connect endpoint.
pub struct HttpNegotiator {
    client: reqwest::Client,
    connection_url: String,
    access_token: String,
    origin: Option<String>,
}

impl HttpNegotiator {
    /// # Errors
    ///
    /// Returns [`ConnectError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConnectError> {
        let client = build_client(config.connect_timeout)
            .map_err(|e| ConnectError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            connection_url: config.connection_url.clone(),
            access_token: config.access_token.clone(),
            origin: config.origin.clone(),
        })
    }
}

#[async_trait]
impl ConnectionNegotiator for HttpNegotiator {
    async fn negotiate(&self) -> Result<String, ConnectError> {
        debug!(url = %self.connection_url, "requesting console connection");

        let mut request = self
            .client
            .post(&self.connection_url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, "0")
            .body(Vec::new());
        if let Some(origin) = &self.origin {
            request = request.header(ORIGIN, origin);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ConnectError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;
        let parsed: ConnectResponse =
            serde_json::from_str(&body).map_err(|e| ConnectError::MalformedBody(e.to_string()))?;
        if parsed.connection_string.is_empty() {
            return Err(ConnectError::MalformedBody("empty connectionString".into()));
        }

        info!("console connection negotiated");
        Ok(parsed.connection_string)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use tokio_test::assert_err;

    use super::*;

    fn config(url: String) -> ConsoleConfig {
        ConsoleConfig {
            connection_url: url,
            access_token: "abc".to_string(),
            origin: Some("https://portal.example".to_string()),
            ..ConsoleConfig::default()
        }
    }

    #[tokio::test]
    async fn test_negotiate_returns_connection_string() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/connect")
            .match_query(Matcher::UrlEncoded("api-version".into(), "2018-05-01".into()))
            .match_header("authorization", "Bearer abc")
            .match_header("accept", "application/json")
            .match_header("content-type", "application/json")
            .match_header("content-length", "0")
            .match_header("origin", "https://portal.example")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"connectionString":"wss://host/client"}"#)
            .create_async()
            .await;
        let negotiator =
            HttpNegotiator::new(&config(format!("{}/connect?api-version=2018-05-01", server.url())))
                .unwrap();

        // Act
        let result = negotiator.negotiate().await;

        // Assert
        assert_eq!(result.unwrap(), "wss://host/client");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_200_status_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/connect")
            .with_status(500)
            .with_body(r#"{"error":"boom"}"#)
            .create_async()
            .await;
        let negotiator = HttpNegotiator::new(&config(format!("{}/connect", server.url()))).unwrap();

        let result = negotiator.negotiate().await;

        assert!(matches!(result, Err(ConnectError::Status(500))));
    }

    #[tokio::test]
    async fn test_other_success_codes_are_still_failures() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/connect")
            .with_status(202)
            .with_body(r#"{"connectionString":"wss://host/client"}"#)
            .create_async()
            .await;
        let negotiator = HttpNegotiator::new(&config(format!("{}/connect", server.url()))).unwrap();

        assert!(matches!(negotiator.negotiate().await, Err(ConnectError::Status(202))));
    }

    #[tokio::test]
    async fn test_missing_connection_string_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/connect")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let negotiator = HttpNegotiator::new(&config(format!("{}/connect", server.url()))).unwrap();

        let result = negotiator.negotiate().await;

        assert!(matches!(result, Err(ConnectError::MalformedBody(_))));
    }

    /// A localhost port that nothing listens on.
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_transport_error() {
        // Arrange
        let url = format!("http://127.0.0.1:{}/connect", closed_port());
        let negotiator = HttpNegotiator::new(&config(url)).unwrap();

        // Act
        let result = negotiator.negotiate().await;

        // Assert
        assert_err!(result);
    }
}

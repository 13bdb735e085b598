//! Admin command channel (NMI, reset, SysRq).
//!
//! The admin endpoint lives next to the console stream: the websocket URL is
//! rewritten from `wss://host/.../client` to `https://host/.../adminCommand/<name>`
//! and the command is POSTed there as JSON with the same bearer token.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use tracing::debug;

use serialconsole_core::{admin_command_url, AdminCommand};

use crate::application::ports::{AdminCommandError, AdminCommandSender};
use crate::domain::ConsoleConfig;

use super::build_client;

/// [`AdminCommandSender`] that talks HTTP to the serial console service.
pub struct HttpAdminChannel {
    client: reqwest::Client,
    access_token: String,
}

impl HttpAdminChannel {
    /// # Errors
    ///
    /// Returns [`AdminCommandError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(config: &ConsoleConfig) -> Result<Self, AdminCommandError> {
        let client = build_client(config.connect_timeout)
            .map_err(|e| AdminCommandError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            access_token: config.access_token.clone(),
        })
    }
}

#[async_trait]
impl AdminCommandSender for HttpAdminChannel {
    async fn send(&self, connection_string: &str, command: AdminCommand) -> Result<(), AdminCommandError> {
        let url = admin_command_url(connection_string, &command)?;
        let body = command.to_request();
        debug!(%command, request_id = %body.request_id, "sending admin command");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, "en")
            .json(&body)
            .send()
            .await
            .map_err(|e| AdminCommandError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdminCommandError::Status(status.as_u16()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn channel() -> HttpAdminChannel {
        HttpAdminChannel::new(&ConsoleConfig {
            access_token: "abc".to_string(),
            ..ConsoleConfig::default()
        })
        .unwrap()
    }

    /// `ws://127.0.0.1:<port>/client` for a mockito server.
    fn console_url(server: &mockito::Server) -> String {
        format!("{}/client", server.url().replacen("http://", "ws://", 1))
    }

    #[tokio::test]
    async fn test_nmi_posts_to_derived_endpoint() {
        // Arrange
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/adminCommand/nmi")
            .match_header("authorization", "Bearer abc")
            .match_header("accept", "application/json")
            .match_header("accept-language", "en")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "command": "nmi",
                "commandParameters": {}
            })))
            .with_status(200)
            .create_async()
            .await;

        // Act
        let result = channel().send(&console_url(&server), AdminCommand::Nmi).await;

        // Assert
        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sysrq_carries_key_parameter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/adminCommand/sysrq")
            .match_body(Matcher::PartialJson(json!({
                "command": "sysrq",
                "commandParameters": { "SysRqCommand": "b" }
            })))
            .with_status(200)
            .create_async()
            .await;

        channel()
            .send(&console_url(&server), AdminCommand::SysRq { key: b'b' })
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_id_is_a_fresh_uuid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/adminCommand/reset")
            .match_body(Matcher::Regex(
                r#""requestId":"[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[0-9a-f]{4}-[0-9a-f]{12}""#.into(),
            ))
            .with_status(200)
            .expect(2)
            .create_async()
            .await;
        let channel = channel();

        channel.send(&console_url(&server), AdminCommand::Reset).await.unwrap();
        channel.send(&console_url(&server), AdminCommand::Reset).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/adminCommand/reset")
            .with_status(403)
            .create_async()
            .await;

        let result = channel().send(&console_url(&server), AdminCommand::Reset).await;

        assert!(matches!(result, Err(AdminCommandError::Status(403))));
    }

    #[tokio::test]
    async fn test_unusable_console_url_fails_before_any_request() {
        let result = channel().send("https://host/client", AdminCommand::Nmi).await;
        assert!(matches!(result, Err(AdminCommandError::Endpoint(_))));
    }
}

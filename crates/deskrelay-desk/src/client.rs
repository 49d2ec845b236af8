// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the desk conversation API.
//!
//! [`DeskClient`] builds requests against a tenant's [`DeskCredential`] and
//! returns typed errors. Folding those errors into fail-soft results is the
//! job of [`crate::HttpDesk`].

use std::time::Duration;

use deskrelay_config::model::DeskConfig;
use deskrelay_core::{ConversationSnapshot, DeskCredential, RelayError, RemoteStatus};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::debug;

use crate::types::{AssignmentBody, ConversationPayload, ToggleStatusBody};

/// Header carrying the desk API token.
const TOKEN_HEADER: &str = "api_access_token";

/// Low-level desk API client. One instance is shared by every tenant; the
/// credential travels with each call.
#[derive(Debug, Clone)]
pub struct DeskClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl DeskClient {
    /// Build a client from the `[desk]` configuration section.
    pub fn new(config: &DeskConfig) -> Result<Self, RelayError> {
        Self::with_timeout(Duration::from_secs(config.timeout_secs), &config.user_agent)
    }

    /// Build a client with an explicit per-request timeout.
    pub fn with_timeout(timeout: Duration, user_agent: &str) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| RelayError::Desk {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client, timeout })
    }

    fn conversation_url(cred: &DeskCredential, conversation_id: u64) -> String {
        format!(
            "{}/api/v1/accounts/{}/conversations/{}",
            cred.base(),
            cred.account_id.trim(),
            conversation_id
        )
    }

    /// `GET …/conversations/{id}`.
    pub async fn fetch_conversation(
        &self,
        cred: &DeskCredential,
        conversation_id: u64,
    ) -> Result<ConversationSnapshot, RelayError> {
        let url = Self::conversation_url(cred, conversation_id);
        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, cred.api_token.expose_secret())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, conversation_id, "conversation fetched");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Desk {
                message: format!("desk returned {status}: {body}"),
                source: None,
            });
        }

        let payload: ConversationPayload =
            response.json().await.map_err(|e| RelayError::Desk {
                message: format!("failed to parse conversation body: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(payload.into_snapshot(conversation_id))
    }

    /// `POST …/conversations/{id}/toggle_status`.
    pub async fn toggle_status(
        &self,
        cred: &DeskCredential,
        conversation_id: u64,
        status: &RemoteStatus,
    ) -> Result<(), RelayError> {
        let url = format!("{}/toggle_status", Self::conversation_url(cred, conversation_id));
        self.post(cred, &url, &ToggleStatusBody {
            status: status.as_str(),
        })
        .await
    }

    /// `POST …/conversations/{id}/assignments` with `{"assignee_id": n}`.
    pub async fn assign_agent(
        &self,
        cred: &DeskCredential,
        conversation_id: u64,
        agent_id: u64,
    ) -> Result<(), RelayError> {
        let url = format!("{}/assignments", Self::conversation_url(cred, conversation_id));
        let body = AssignmentBody {
            assignee_id: Some(agent_id),
            ..AssignmentBody::default()
        };
        self.post(cred, &url, &body).await
    }

    /// `POST …/conversations/{id}/assignments` with `{"team_id": n}`.
    pub async fn assign_team(
        &self,
        cred: &DeskCredential,
        conversation_id: u64,
        team_id: u64,
    ) -> Result<(), RelayError> {
        let url = format!("{}/assignments", Self::conversation_url(cred, conversation_id));
        let body = AssignmentBody {
            team_id: Some(team_id),
            ..AssignmentBody::default()
        };
        self.post(cred, &url, &body).await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        cred: &DeskCredential,
        url: &str,
        body: &B,
    ) -> Result<(), RelayError> {
        let response = self
            .client
            .post(url)
            .header(TOKEN_HEADER, cred.api_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, url, "desk POST completed");
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RelayError::Desk {
            message: format!("desk returned {status}: {body}"),
            source: None,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            RelayError::Timeout {
                duration: self.timeout,
            }
        } else {
            RelayError::Desk {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> DeskClient {
        DeskClient::with_timeout(Duration::from_millis(300), "deskrelay-test").unwrap()
    }

    fn cred(base: &str) -> DeskCredential {
        DeskCredential {
            base_url: format!("{base}/"),
            api_token: SecretString::from("desk-token".to_string()),
            account_id: "3".into(),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn fetch_sends_token_and_parses_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/accounts/3/conversations/42"))
            .and(header("api_access_token", "desk-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 42,
                "status": "open",
                "meta": {"assignee": {"id": 7}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let snap = test_client()
            .fetch_conversation(&cred(&server.uri()), 42)
            .await
            .unwrap();
        assert_eq!(snap.id, 42);
        assert_eq!(snap.assignee_id, Some(7));
        assert_eq!(snap.status, RemoteStatus::Open);
    }

    #[tokio::test]
    async fn fetch_non_2xx_is_desk_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = test_client()
            .fetch_conversation(&cred(&server.uri()), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Desk { .. }), "got: {err:?}");
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "open"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = test_client()
            .fetch_conversation(&cred(&server.uri()), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Timeout { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn toggle_status_posts_status_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/3/conversations/9/toggle_status"))
            .and(header("api_access_token", "desk-token"))
            .and(body_json(serde_json::json!({"status": "resolved"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        test_client()
            .toggle_status(&cred(&server.uri()), 9, &RemoteStatus::Resolved)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn assignments_post_one_field_each() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/3/conversations/9/assignments"))
            .and(body_json(serde_json::json!({"assignee_id": 4})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/3/conversations/9/assignments"))
            .and(body_json(serde_json::json!({"team_id": 2})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client();
        let c = cred(&server.uri());
        client.assign_agent(&c, 9, 4).await.unwrap();
        client.assign_team(&c, 9, 2).await.unwrap();
    }
}

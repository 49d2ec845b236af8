// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote desk adapter for deskrelay.
//!
//! [`HttpDesk`] implements [`RemoteDesk`] on top of [`client::DeskClient`].
//! Every failure (transport error, timeout, non-2xx, malformed body) is
//! logged with the operation and conversation id and surfaced as `None` or
//! `false`. Unusable credentials short-circuit before any request is built.

pub mod client;
pub mod types;

use async_trait::async_trait;
use deskrelay_config::model::DeskConfig;
use deskrelay_core::{
    AdapterType, Assignment, AssignmentReport, ConversationSnapshot, DeskCredential,
    HealthStatus, PluginAdapter, RelayError, RemoteDesk, RemoteStatus,
};
use tracing::{debug, error, info};

pub use crate::client::DeskClient;

/// Fail-soft desk adapter.
#[derive(Debug, Clone)]
pub struct HttpDesk {
    client: DeskClient,
}

impl HttpDesk {
    pub fn new(config: &DeskConfig) -> Result<Self, RelayError> {
        Ok(Self {
            client: DeskClient::new(config)?,
        })
    }

    /// Wrap an already-built client.
    pub fn from_client(client: DeskClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for HttpDesk {
    fn name(&self) -> &str {
        "chatwoot-http"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::RemoteDesk
    }

    /// The desk is per-tenant, so there is nothing global to probe.
    async fn health_check(&self) -> Result<HealthStatus, RelayError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RelayError> {
        Ok(())
    }
}

#[async_trait]
impl RemoteDesk for HttpDesk {
    async fn get_conversation(
        &self,
        credential: &DeskCredential,
        conversation_id: u64,
    ) -> Option<ConversationSnapshot> {
        if !credential.is_usable() {
            debug!(conversation_id, "desk credential unusable, skipping fetch");
            return None;
        }
        match self.client.fetch_conversation(credential, conversation_id).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                error!(conversation_id, error = %e, "error fetching desk conversation");
                None
            }
        }
    }

    async fn set_status(
        &self,
        credential: &DeskCredential,
        conversation_id: u64,
        status: &RemoteStatus,
    ) -> bool {
        if !credential.is_usable() {
            debug!(conversation_id, "desk credential unusable, skipping status change");
            return false;
        }
        match self
            .client
            .toggle_status(credential, conversation_id, status)
            .await
        {
            Ok(()) => {
                info!(conversation_id, status = %status, "desk conversation status changed");
                true
            }
            Err(e) => {
                error!(conversation_id, status = %status, error = %e, "error changing desk conversation status");
                false
            }
        }
    }

    async fn assign(
        &self,
        credential: &DeskCredential,
        conversation_id: u64,
        assignment: &Assignment,
    ) -> AssignmentReport {
        let mut report = AssignmentReport::default();
        if !credential.is_usable() {
            debug!(conversation_id, "desk credential unusable, skipping assignment");
            report.agent = assignment.agent_id.map(|_| false);
            report.team = assignment.team_id.map(|_| false);
            return report;
        }

        if let Some(agent_id) = assignment.agent_id {
            let ok = match self.client.assign_agent(credential, conversation_id, agent_id).await {
                Ok(()) => {
                    info!(conversation_id, agent_id, "assigned agent to desk conversation");
                    true
                }
                Err(e) => {
                    error!(conversation_id, agent_id, error = %e, "error assigning agent");
                    false
                }
            };
            report.agent = Some(ok);
        }

        if let Some(team_id) = assignment.team_id {
            let ok = match self.client.assign_team(credential, conversation_id, team_id).await {
                Ok(()) => {
                    info!(conversation_id, team_id, "assigned team to desk conversation");
                    true
                }
                Err(e) => {
                    error!(conversation_id, team_id, error = %e, "error assigning team");
                    false
                }
            };
            report.team = Some(ok);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use secrecy::SecretString;
    use tracing_test::traced_test;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn desk() -> HttpDesk {
        HttpDesk::from_client(
            DeskClient::with_timeout(Duration::from_millis(300), "deskrelay-test").unwrap(),
        )
    }

    fn cred(base: &str, enabled: bool) -> DeskCredential {
        DeskCredential {
            base_url: base.to_string(),
            api_token: SecretString::from("tok".to_string()),
            account_id: "1".into(),
            enabled,
        }
    }

    #[test]
    fn adapter_identity() {
        let d = desk();
        assert_eq!(d.name(), "chatwoot-http");
        assert_eq!(d.adapter_type(), AdapterType::RemoteDesk);
    }

    #[tokio::test]
    async fn unusable_credential_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let d = desk();
        let disabled = cred(&server.uri(), false);
        assert!(d.get_conversation(&disabled, 1).await.is_none());
        assert!(!d.set_status(&disabled, 1, &RemoteStatus::Open).await);
        let report = d
            .assign(
                &disabled,
                1,
                &Assignment {
                    agent_id: Some(2),
                    team_id: None,
                },
            )
            .await;
        assert_eq!(report.agent, Some(false));
        assert_eq!(report.team, None);

        let mut blank = cred(&server.uri(), true);
        blank.account_id = "  ".into();
        assert!(d.get_conversation(&blank, 1).await.is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn failures_are_logged_and_folded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let d = desk();
        let c = cred(&server.uri(), true);
        assert!(d.get_conversation(&c, 5).await.is_none());
        assert!(!d.set_status(&c, 5, &RemoteStatus::Resolved).await);
        assert!(logs_contain("error fetching desk conversation"));
        assert!(logs_contain("error changing desk conversation status"));
    }

    #[tokio::test]
    async fn timeout_is_a_normal_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "open"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        assert!(desk().get_conversation(&cred(&server.uri(), true), 5).await.is_none());
    }

    #[tokio::test]
    async fn assignment_steps_are_independent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/1/conversations/5/assignments"))
            .and(body_json(serde_json::json!({"assignee_id": 3})))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/accounts/1/conversations/5/assignments"))
            .and(body_json(serde_json::json!({"team_id": 6})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let report = desk()
            .assign(
                &cred(&server.uri(), true),
                5,
                &Assignment {
                    agent_id: Some(3),
                    team_id: Some(6),
                },
            )
            .await;
        assert_eq!(report.agent, Some(false));
        assert_eq!(report.team, Some(true));
    }

    #[tokio::test]
    async fn malformed_body_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        assert!(desk().get_conversation(&cred(&server.uri(), true), 5).await.is_none());
    }
}

// SPDX-FileCopyrightText: 2026 deskrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the desk conversation API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use deskrelay_core::{ConversationSnapshot, RemoteStatus};

/// Body of `GET /api/v1/accounts/{account}/conversations/{id}`.
///
/// Only the fields the coordinator reads are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationPayload {
    #[serde(default)]
    pub id: Option<u64>,
    pub status: String,
    #[serde(default)]
    pub meta: Option<ConversationMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationMeta {
    #[serde(default)]
    pub assignee: Option<IdRef>,
    #[serde(default)]
    pub team: Option<IdRef>,
}

/// A nested object such as `meta.assignee`. Its shape is not trusted beyond
/// being non-null; `id` is read only when it is numeric.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct IdRef(Value);

impl IdRef {
    pub fn id(&self) -> Option<u64> {
        self.0.get("id").and_then(Value::as_u64)
    }
}

impl ConversationPayload {
    /// Convert into a snapshot. `requested_id` fills in a missing `id`.
    pub fn into_snapshot(self, requested_id: u64) -> ConversationSnapshot {
        let meta = self.meta.unwrap_or_default();
        ConversationSnapshot {
            id: self.id.unwrap_or(requested_id),
            assigned: meta.assignee.is_some(),
            assignee_id: meta.assignee.as_ref().and_then(IdRef::id),
            team_id: meta.team.as_ref().and_then(IdRef::id),
            status: RemoteStatus::from(self.status),
        }
    }
}

/// Body of `POST …/toggle_status`.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleStatusBody<'a> {
    pub status: &'a str,
}

/// Body of `POST …/assignments`. Exactly one field is set per request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_reads_assignee_and_team_from_meta() {
        let json = serde_json::json!({
            "id": 17,
            "status": "open",
            "inbox_id": 2,
            "meta": {
                "sender": {"id": 99, "name": "Ana"},
                "assignee": {"id": 5, "name": "Agent"},
                "team": {"id": 8, "name": "Support"}
            }
        });
        let payload: ConversationPayload = serde_json::from_value(json).unwrap();
        let snap = payload.into_snapshot(17);
        assert_eq!(snap.assignee_id, Some(5));
        assert_eq!(snap.team_id, Some(8));
        assert!(snap.is_human_owned());
    }

    #[test]
    fn payload_without_meta_has_no_assignee() {
        let payload: ConversationPayload =
            serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        let snap = payload.into_snapshot(3);
        assert_eq!(snap.id, 3);
        assert_eq!(snap.assignee_id, None);
        assert_eq!(snap.status, RemoteStatus::Pending);
    }

    #[test]
    fn null_assignee_is_absent() {
        let payload: ConversationPayload =
            serde_json::from_str(r#"{"id":1,"status":"open","meta":{"assignee":null}}"#).unwrap();
        assert!(!payload.into_snapshot(1).is_human_owned());
    }

    #[test]
    fn assignee_without_numeric_id_still_counts_as_assigned() {
        let payload: ConversationPayload = serde_json::from_str(
            r#"{"id":2,"status":"open","meta":{"assignee":{"name":"Agent","id":"a-7"},"team":{}}}"#,
        )
        .unwrap();
        let snap = payload.into_snapshot(2);
        assert!(snap.assigned);
        assert_eq!(snap.assignee_id, None);
        assert_eq!(snap.team_id, None);
        assert!(snap.is_human_owned());
    }

    #[test]
    fn assignment_body_serializes_single_field() {
        let agent = AssignmentBody {
            assignee_id: Some(4),
            ..AssignmentBody::default()
        };
        assert_eq!(serde_json::to_string(&agent).unwrap(), r#"{"assignee_id":4}"#);
        let team = AssignmentBody {
            team_id: Some(9),
            ..AssignmentBody::default()
        };
        assert_eq!(serde_json::to_string(&team).unwrap(), r#"{"team_id":9}"#);
    }
}

// ── Operation state machine ──
//
// One `OperationState` per in-progress modal: created when the user
// submits, removed when the modal is dismissed.
//
//   Idle ──submit──▶ Submitting ──ok──▶ Succeeded
//                        │
//                        └──err──▶ Failed ──edit──▶ Idle

use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::{CoreError, ErrorKind};
use crate::model::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    RoleChange,
    StatusToggle,
    MarkRead,
}

impl OperationKind {
    /// Past tense for toasts: "user 7 deleted".
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
            Self::RoleChange => "role changed",
            Self::StatusToggle => "status changed",
            Self::MarkRead => "marked read",
        }
    }
}

/// What an operation acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationTarget {
    /// A record that does not exist yet (the create modal).
    New,
    /// The n-th row of a bulk import.
    Row(usize),
    /// An existing record.
    Record(EntityId),
}

impl fmt::Display for OperationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("new record"),
            Self::Row(n) => write!(f, "row {n}"),
            Self::Record(id) => write!(f, "{id}"),
        }
    }
}

impl From<EntityId> for OperationTarget {
    fn from(id: EntityId) -> Self {
        Self::Record(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OperationKey {
    pub kind: OperationKind,
    pub target: OperationTarget,
}

impl OperationKey {
    pub fn new(kind: OperationKind, target: impl Into<OperationTarget>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }
}

/// The error shown next to the submit control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CoreError> for OperationError {
    fn from(err: &CoreError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "error", rename_all = "kebab-case")]
pub enum OperationPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(OperationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationState {
    pub key: OperationKey,
    pub phase: OperationPhase,
}

impl OperationState {
    pub fn is_submit_disabled(&self) -> bool {
        self.phase == OperationPhase::Submitting
    }

    pub fn last_error(&self) -> Option<&OperationError> {
        match &self.phase {
            OperationPhase::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Broadcast once per settled operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationEvent {
    pub entity_type: &'static str,
    pub key: OperationKey,
    pub error: Option<OperationError>,
}

impl OperationEvent {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for OperationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            None => write!(
                f,
                "{} {} {}",
                self.entity_type,
                self.key.target,
                self.key.kind.past_tense()
            ),
            Some(err) => write!(
                f,
                "{} on {} {} failed: {}",
                self.key.kind, self.entity_type, self.key.target, err.message
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn only_submitting_disables_submit() {
        let key = OperationKey::new(OperationKind::Delete, EntityId::Number(7));
        let mut state = OperationState {
            key,
            phase: OperationPhase::Submitting,
        };
        assert!(state.is_submit_disabled());

        state.phase = OperationPhase::Failed(OperationError {
            kind: ErrorKind::Network,
            message: "offline".into(),
        });
        assert!(!state.is_submit_disabled());
        assert_eq!(state.last_error().map(|e| e.message.as_str()), Some("offline"));
    }

    #[test]
    fn event_reads_as_toast() {
        let ok = OperationEvent {
            entity_type: "device",
            key: OperationKey::new(OperationKind::Delete, EntityId::Number(7)),
            error: None,
        };
        assert_eq!(ok.to_string(), "device 7 deleted");

        let failed = OperationEvent {
            entity_type: "user",
            key: OperationKey::new(OperationKind::RoleChange, EntityId::Number(2)),
            error: Some(OperationError {
                kind: ErrorKind::RemoteRejected,
                message: "forbidden".into(),
            }),
        };
        assert_eq!(failed.to_string(), "role-change on user 2 failed: forbidden");
    }

    #[test]
    fn failed_error_serializes_with_kebab_kind() {
        let err = OperationError {
            kind: ErrorKind::RemoteRejected,
            message: "MAC already registered".into(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({ "kind": "remote-rejected", "message": "MAC already registered" })
        );
    }
}

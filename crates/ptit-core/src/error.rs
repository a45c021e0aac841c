// ── Core error types ──
//
// User-facing errors from ptit-core. Consumers never see HTTP plumbing
// directly: the `From<ptit_api::Error>` impl folds transport failures
// into the four-way operation taxonomy (validation / network /
// rejected / not found) plus session and orchestration errors.

use thiserror::Error;

use crate::crud::OperationKind;

/// Shown when a request never reached the server.
pub const CONNECTIVITY_MESSAGE: &str =
    "Could not reach the server. Check your connection and try again.";

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Local errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Rejected by server (HTTP {status}): {message}")]
    RemoteRejected {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
        message: Option<String>,
    },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Orchestration errors ─────────────────────────────────────────
    #[error("A {kind} operation on {target} is already in progress")]
    OperationInFlight { kind: OperationKind, target: String },

    #[error("Operation result discarded: owner detached")]
    Detached,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by the UI to pick a recovery path:
/// retry (network) vs. fix input and resubmit (validation / rejection).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    Validation,
    Network,
    RemoteRejected,
    NotFound,
    Authentication,
    Busy,
    Internal,
}

impl CoreError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.to_owned()),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::Config { .. } => ErrorKind::Validation,
            Self::Network { .. } | Self::Timeout { .. } => ErrorKind::Network,
            Self::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::OperationInFlight { .. } => ErrorKind::Busy,
            Self::Detached | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Retrying the same request unchanged can only help for network failures.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    /// The message to show next to the submit control.
    ///
    /// Remote payload text when the server supplied one, otherwise the
    /// generic connectivity message for network failures.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => CONNECTIVITY_MESSAGE.to_owned(),
            Self::RemoteRejected { message, .. }
            | Self::Validation { message, .. }
            | Self::Authentication { message } => message.clone(),
            Self::NotFound {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Attach the entity type and identifier to a bare `NotFound`.
    pub(crate) fn for_target(self, entity_type: &str, identifier: &str) -> Self {
        match self {
            Self::NotFound { message, .. } => Self::NotFound {
                entity_type: entity_type.to_owned(),
                identifier: identifier.to_owned(),
                message,
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ptit_api::Error> for CoreError {
    fn from(err: ptit_api::Error) -> Self {
        if err.is_not_found() {
            let message = match &err {
                ptit_api::Error::Api { message, .. } => Some(message.clone()),
                _ => None,
            };
            return CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: String::new(),
                message,
            };
        }

        match err {
            ptit_api::Error::Authentication { message } => CoreError::Authentication { message },
            ptit_api::Error::NoSession => CoreError::Authentication {
                message: "No active session -- log in first".into(),
            },
            ptit_api::Error::Transport(ref e) if e.is_timeout() => CoreError::Timeout {
                message: e.to_string(),
            },
            ptit_api::Error::Transport(ref e) => match e.status() {
                Some(status) => CoreError::RemoteRejected {
                    status: status.as_u16(),
                    message: e.to_string(),
                    code: None,
                },
                None => CoreError::Network {
                    message: e.to_string(),
                },
            },
            ptit_api::Error::Tls(message) => CoreError::Network {
                message: format!("TLS error: {message}"),
            },
            ptit_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ptit_api::Error::Api {
                status,
                message,
                code,
            } => CoreError::RemoteRejected {
                status,
                message,
                code,
            },
            ptit_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_server_message() {
        let err = CoreError::from(ptit_api::Error::Api {
            status: 404,
            message: "User 7 does not exist".into(),
            code: None,
        })
        .for_target("user", "7");

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.user_message(), "User 7 does not exist");
        assert!(err.to_string().contains("user not found: 7"));
    }

    #[test]
    fn rejection_is_not_retryable() {
        let err = CoreError::from(ptit_api::Error::Api {
            status: 422,
            message: "name is taken".into(),
            code: Some("dup".into()),
        });
        assert_eq!(err.kind(), ErrorKind::RemoteRejected);
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), "name is taken");
    }

    #[test]
    fn network_uses_generic_message() {
        let err = CoreError::from(ptit_api::Error::Tls("handshake".into()));
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), CONNECTIVITY_MESSAGE);
    }
}

//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use ptit_config::ConfigError;
use ptit_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the server")]
    #[diagnostic(
        code(ptit::connection_failed),
        help(
            "Check your connection and that the backend is running.\n\
             Self-signed certificate? Use --insecure (-k) or set ca_cert in your profile.\n\
             Detail: {detail}"
        )
    )]
    ConnectionFailed { detail: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(ptit::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(ptit::auth_failed),
        help(
            "The token may have expired. Log in again and store the new token:\n\
             ptit config set-token --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No token configured for profile '{profile}'")]
    #[diagnostic(
        code(ptit::no_credentials),
        help(
            "Configure one with: ptit config init\n\
             Or pass --token / set PTIT_TOKEN."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(ptit::not_found),
        help("Run: ptit {list_command} to see available records")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Conflict: {message}")]
    #[diagnostic(code(ptit::conflict))]
    Conflict { message: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(ptit::permission),
        help("This action needs an administrator account.")
    )]
    PermissionDenied { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Rejected by server (HTTP {status}): {message}")]
    #[diagnostic(code(ptit::rejected))]
    Rejected {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("{0}")]
    #[diagnostic(
        code(ptit::busy),
        help("Wait for the pending request to finish, then try again.")
    )]
    Busy(String),

    #[error("{failed} of {total} records failed")]
    #[diagnostic(
        code(ptit::partial_failure),
        help("Fix the rows listed above and import them again.")
    )]
    PartialFailure { failed: usize, total: usize },

    #[error("Internal error: {0}")]
    #[diagnostic(code(ptit::internal))]
    Internal(String),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ptit::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ptit::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: ptit config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(ptit::no_config),
        help(
            "Create a profile with: ptit config init\n\
             Or pass --api-url and --token.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ptit::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(ptit::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(ptit::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Output rendering failed: {0}")]
    #[diagnostic(code(ptit::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the `ptit <resource> list` hint for a not-found record.
    pub fn not_found(resource_type: &str, identifier: &str) -> Self {
        Self::NotFound {
            resource_type: resource_type.to_owned(),
            identifier: identifier.to_owned(),
            list_command: list_command(resource_type),
        }
    }
}

fn list_command(entity_type: &str) -> String {
    match entity_type {
        "history entry" => "history list".into(),
        other => format!("{}s list", other.replace(' ', "-")),
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { message } => CliError::ConnectionFailed { detail: message },

            CoreError::Timeout { .. } => CliError::Timeout,

            CoreError::Authentication { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
                ..
            } => CliError::not_found(&entity_type, &identifier),

            CoreError::RemoteRejected {
                status: 409,
                message,
                ..
            } => CliError::Conflict { message },

            CoreError::RemoteRejected {
                status: 403,
                message,
                ..
            } => CliError::PermissionDenied { message },

            CoreError::RemoteRejected {
                status: 408 | 504,
                ..
            } => CliError::Timeout,

            CoreError::RemoteRejected {
                status,
                message,
                code,
            } => CliError::Rejected {
                status,
                message,
                code,
            },

            CoreError::Validation { field, message } => CliError::Validation {
                field: field.unwrap_or_else(|| "input".into()),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            err @ CoreError::OperationInFlight { .. } => CliError::Busy(err.to_string()),

            CoreError::Detached => CliError::Internal("operation owner went away".into()),

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(see: ptit config profiles)".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::Network {
                    message: "refused".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::Timeout {
                    message: "30s".into(),
                },
                exit_code::TIMEOUT,
            ),
            (
                CoreError::Authentication {
                    message: "expired".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::NotFound {
                    entity_type: "device".into(),
                    identifier: "7".into(),
                    message: None,
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::RemoteRejected {
                    status: 409,
                    message: "duplicate".into(),
                    code: None,
                },
                exit_code::CONFLICT,
            ),
            (
                CoreError::RemoteRejected {
                    status: 422,
                    message: "bad".into(),
                    code: None,
                },
                exit_code::GENERAL,
            ),
            (CoreError::validation("name", "required"), exit_code::USAGE),
        ];
        for (core, code) in cases {
            let label = core.to_string();
            assert_eq!(CliError::from(core).exit_code(), code, "{label}");
        }
    }

    #[test]
    fn not_found_points_at_list_command() {
        let err = CliError::not_found("device type", "3");
        let CliError::NotFound { list_command, .. } = err else {
            panic!("expected NotFound");
        };
        assert_eq!(list_command, "device-types list");
        let CliError::NotFound { list_command, .. } = CliError::not_found("history entry", "1")
        else {
            panic!("expected NotFound");
        };
        assert_eq!(list_command, "history list");
    }
}

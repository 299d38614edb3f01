//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use aquadash_config::ConfigError;
use aquadash_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const VALIDATION: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to the dashboard server")]
    #[diagnostic(code(aquadash::connection_failed), help("{hint}"))]
    ConnectionFailed {
        hint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Not connected: {action} was dropped")]
    #[diagnostic(
        code(aquadash::not_connected),
        help("The connection dropped before the message could be sent. Retry the command.")
    )]
    NotConnected { action: String },

    #[error("No session id configured for profile '{profile}'")]
    #[diagnostic(
        code(aquadash::no_session),
        help(
            "Store one with: aquadash config set-session\n\
             Or set AQUADASH_SESSION_ID / pass --session-id."
        )
    )]
    NoSession { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("Device '{identifier}' not found")]
    #[diagnostic(
        code(aquadash::not_found),
        help("Run: aquadash list to see available devices")
    )]
    DeviceNotFound { identifier: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aquadash::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(aquadash::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: aquadash config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No dashboard endpoint configured")]
    #[diagnostic(
        code(aquadash::no_config),
        help(
            "Create a profile with: aquadash config init\n\
             Or pass --endpoint. Config expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(aquadash::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(aquadash::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Timed out after {seconds}s waiting for the server")]
    #[diagnostic(
        code(aquadash::timeout),
        help("Increase the wait with --timeout or check the server.")
    )]
    Timeout { seconds: u64 },

    // ── Internal / IO ────────────────────────────────────────────────

    #[error("{0}")]
    #[diagnostic(code(aquadash::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(aquadash::json), help("Quote the value for your shell, e.g. --params '{{\"level\":50}}'"))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Connection failure, naming the endpoint in the help text when known.
    pub fn connection_failed(
        endpoint: Option<&str>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let mut hint =
            String::from("Check that the server is running and the endpoint is a ws:// or wss:// URL.");
        if let Some(endpoint) = endpoint {
            hint.push_str("\nEndpoint: ");
            hint.push_str(endpoint);
        }
        Self::ConnectionFailed {
            hint,
            source: source.into(),
        }
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::NotConnected { .. } => exit_code::CONNECTION,
            Self::DeviceNotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Json(_) => exit_code::VALIDATION,
            Self::NonInteractiveRequiresYes { .. } | Self::NoConfig { .. } | Self::NoSession { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::connection_failed(None, reason),

            CoreError::NotConnected => CliError::NotConnected {
                action: "command".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::DeviceNotFound { identifier } => CliError::DeviceNotFound { identifier },

            CoreError::Validation(errors) => CliError::Validation {
                field: "device".into(),
                reason: errors.to_string(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Decode { message } | CoreError::Internal(message) => {
                CliError::Internal(message)
            }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoSession { profile } => CliError::NoSession { profile },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquadash_core::{FieldError, FieldErrors};

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(
            CliError::from(CoreError::Timeout { timeout_secs: 3 }).exit_code(),
            exit_code::TIMEOUT
        );
        assert_eq!(
            CliError::from(CoreError::DeviceNotFound {
                identifier: "d1".into()
            })
            .exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(CoreError::NotConnected).exit_code(),
            exit_code::CONNECTION
        );
        assert_eq!(
            CliError::NoSession {
                profile: "default".into()
            }
            .exit_code(),
            exit_code::USAGE
        );
    }

    #[test]
    fn validation_errors_keep_field_detail() {
        let err = CliError::from(CoreError::Validation(FieldErrors {
            id: Some(FieldError::Required),
            name: None,
        }));
        assert_eq!(err.exit_code(), exit_code::VALIDATION);
        assert!(err.to_string().contains("id: required"));
    }

    #[test]
    fn connection_hint_names_endpoint_only_when_known() {
        let known = CliError::connection_failed(Some("ws://tanks.local/ws"), "refused");
        let unknown = CliError::from(CoreError::ConnectionFailed {
            reason: "refused".into(),
        });

        let help = |err: &CliError| err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help(&known).ends_with("Endpoint: ws://tanks.local/ws"));
        assert!(!help(&unknown).contains("Endpoint"));
        assert_eq!(unknown.exit_code(), exit_code::CONNECTION);
        assert_eq!(known.to_string(), "Could not connect to the dashboard server");
    }
}

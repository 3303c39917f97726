use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Socket unreachable at {address}: {reason}")]
    SocketUnreachable { address: String, reason: String },

    #[error("Handshake with {address} did not complete within {timeout:?}")]
    HandshakeTimeout { address: String, timeout: Duration },

    #[error("Handshake rejected{}: {message}", code_suffix(.code))]
    HandshakeRejected { code: Option<i32>, message: String },

    #[error("Unexpected error: {message}")]
    UnexpectedError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorCategory {
    Network,
    Protocol,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl CheckError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CheckError::SocketUnreachable { .. } | CheckError::HandshakeTimeout { .. } => {
                ErrorCategory::Network
            }
            CheckError::HandshakeRejected { .. } => ErrorCategory::Protocol,
            CheckError::ConfigError { .. }
            | CheckError::InvalidConfigValueError { .. }
            | CheckError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CheckError::UnexpectedError { .. }
            | CheckError::IoError(_)
            | CheckError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Protocol => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Stable snake_case name of the variant, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::SocketUnreachable { .. } => "socket_unreachable",
            CheckError::HandshakeTimeout { .. } => "handshake_timeout",
            CheckError::HandshakeRejected { .. } => "handshake_rejected",
            CheckError::UnexpectedError { .. } => "unexpected_error",
            CheckError::IoError(_) => "io_error",
            CheckError::SerializationError(_) => "serialization_error",
            CheckError::ConfigError { .. } => "config_error",
            CheckError::InvalidConfigValueError { .. } => "invalid_config_value",
            CheckError::MissingConfigError { .. } => "missing_config",
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CheckError::SocketUnreachable { .. } => concat!(
                "Make sure the gateway container is running (docker compose ps) ",
                "and the port is published"
            ),
            CheckError::HandshakeTimeout { .. } => concat!(
                "Check the gateway is fully initialized (wait 30-60 seconds after start) ",
                "or raise the handshake timeout"
            ),
            CheckError::HandshakeRejected { code: Some(326), .. } => {
                "Another session is using this client id; retry with a unique --client-id"
            }
            CheckError::HandshakeRejected { .. } => concat!(
                "Verify the API is enabled in the gateway settings, ",
                "or restart it (docker compose restart)"
            ),
            CheckError::UnexpectedError { .. }
            | CheckError::IoError(_)
            | CheckError::SerializationError(_) => {
                "Re-run with --verbose and inspect the log output"
            }
            CheckError::ConfigError { .. }
            | CheckError::InvalidConfigValueError { .. }
            | CheckError::MissingConfigError { .. } => {
                "Fix the configuration value and run the check again"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CheckError::SocketUnreachable { address, .. } => {
                format!("Gateway port {} is not accepting connections", address)
            }
            CheckError::HandshakeTimeout { address, timeout } => format!(
                "Gateway at {} accepted the socket but did not finish the API handshake within {}s",
                address,
                timeout.as_secs_f64()
            ),
            CheckError::HandshakeRejected { message, .. } => {
                format!("Gateway refused the API session: {}", message)
            }
            other => other.to_string(),
        }
    }
}

fn code_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" (code {})", c)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let unreachable = CheckError::SocketUnreachable {
            address: "127.0.0.1:4002".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(unreachable.category(), ErrorCategory::Network);
        assert_eq!(unreachable.kind(), "socket_unreachable");

        let rejected = CheckError::HandshakeRejected {
            code: Some(326),
            message: "client id is already in use".to_string(),
        };
        assert_eq!(rejected.category(), ErrorCategory::Protocol);
        assert_eq!(rejected.severity(), ErrorSeverity::High);
        assert!(rejected.recovery_suggestion().contains("client-id"));
        assert_eq!(
            rejected.to_string(),
            "Handshake rejected (code 326): client id is already in use"
        );

        let missing = CheckError::MissingConfigError {
            field: "gateway.host".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Configuration);
        assert_eq!(missing.severity(), ErrorSeverity::Medium);

        let unexpected = CheckError::UnexpectedError {
            message: "socket setup failed".to_string(),
        };
        assert_eq!(unexpected.severity(), ErrorSeverity::Critical);
        assert!(unexpected.severity() > rejected.severity());
    }

    #[test]
    fn test_rejection_without_code_display() {
        let rejected = CheckError::HandshakeRejected {
            code: None,
            message: "connection closed by gateway".to_string(),
        };
        assert_eq!(
            rejected.to_string(),
            "Handshake rejected: connection closed by gateway"
        );
    }
}

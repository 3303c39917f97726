use crate::utils::error::{CheckError, ErrorCategory, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_port, validate_positive_duration,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Process exit status when every required check passed.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit status for any failure, configuration errors included.
pub const EXIT_FAILURE: i32 = 1;

/// One (host, port) target for a check, together with the client id used for the
/// API handshake and the bound on how long any single stage may wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        client_id: i32,
        timeout: Duration,
    ) -> Result<Self> {
        let host = host.into();
        validate_non_empty_string("host", &host)?;
        validate_port("port", port)?;
        validate_positive_duration("timeout", timeout)?;

        Ok(Self {
            host,
            port,
            client_id,
            timeout,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn with_port(&self, port: u16) -> Result<Self> {
        Self::new(self.host.clone(), port, self.client_id, self.timeout)
    }

    pub fn with_timeout(&self, timeout: Duration) -> Result<Self> {
        Self::new(self.host.clone(), self.port, self.client_id, timeout)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} (client id {})", self.host, self.port, self.client_id)
    }
}

/// What the handshake learned while the session was open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub connected: bool,
    pub accounts: Vec<String>,
    pub client_id: i32,
    pub server_version: Option<i32>,
    pub connection_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub label: String,
    pub host: String,
    pub port: u16,
    pub open: bool,
    #[serde(serialize_with = "serialize_latency_ms")]
    pub latency: Option<Duration>,
}

fn serialize_latency_ms<S: serde::Serializer>(
    latency: &Option<Duration>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match latency {
        Some(d) => serializer.serialize_some(&(d.as_secs_f64() * 1000.0)),
        None => serializer.serialize_none(),
    }
}

/// Lifecycle of a single handshake attempt.
///
/// `Idle → Connecting → Connected → Disconnecting → Closed`, or
/// `Connecting → Failed → Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
    Failed,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Connected)
                | (Connecting, Failed)
                | (Connected, Disconnecting)
                | (Disconnecting, Closed)
                | (Failed, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Closed
    }
}

/// Result of the API handshake stage, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandshakeReport {
    Passed(SessionInfo),
    Failed {
        kind: String,
        category: ErrorCategory,
        message: String,
        suggestion: String,
    },
    Skipped {
        reason: String,
    },
}

impl HandshakeReport {
    pub fn from_result(result: &Result<SessionInfo>) -> Self {
        match result {
            Ok(info) => HandshakeReport::Passed(info.clone()),
            Err(e) => HandshakeReport::from_error(e),
        }
    }

    pub fn from_error(error: &CheckError) -> Self {
        HandshakeReport::Failed {
            kind: error.kind().to_string(),
            category: error.category(),
            message: error.user_friendly_message(),
            suggestion: error.recovery_suggestion().to_string(),
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, HandshakeReport::Passed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub checked_at: DateTime<Utc>,
    pub target: String,
    pub probes: Vec<ProbeResult>,
    pub handshake: HandshakeReport,
}

impl CheckReport {
    /// The check passes when the handshake passed. Probes of secondary ports are informational.
    pub fn is_success(&self) -> bool {
        self.handshake.passed()
    }

    pub fn all_probes_open(&self) -> bool {
        self.probes.iter().all(|p| p.open)
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_FAILURE
        }
    }
}

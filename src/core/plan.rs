use crate::core::{ConfigProvider, Endpoint};
use crate::utils::error::{CheckError, Result};
use crate::utils::validation::{validate_range, validate_timeout_secs, MAX_TIMEOUT_SECS};
use std::time::Duration;

/// Gateway API ports and what they are usually bound to.
fn port_label(port: u16) -> Option<&'static str> {
    match port {
        4002 => Some("Gateway paper trading"),
        4001 => Some("Gateway live trading"),
        7497 => Some("TWS paper trading"),
        7496 => Some("TWS live trading"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub label: String,
    pub endpoint: Endpoint,
}

impl ProbeTarget {
    pub fn new(label: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            label: label.into(),
            endpoint,
        }
    }

    fn for_endpoint(endpoint: Endpoint) -> Self {
        let label = port_label(endpoint.port)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Port {}", endpoint.port));
        Self::new(label, endpoint)
    }
}

/// Everything one invocation will check, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckPlan {
    /// Handshake target, carrying the handshake timeout.
    pub primary: Endpoint,
    /// TCP probes, primary port first, each carrying the probe timeout.
    pub probes: Vec<ProbeTarget>,
    pub hold: Duration,
}

impl CheckPlan {
    pub fn from_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let probe_timeout = validate_timeout_secs("probe_timeout", config.probe_timeout_secs())?;
        let handshake_timeout =
            validate_timeout_secs("handshake_timeout", config.handshake_timeout_secs())?;

        let hold_secs = config.hold_secs();
        validate_range("hold", hold_secs, 0.0, MAX_TIMEOUT_SECS)?;
        let hold = Duration::try_from_secs_f64(hold_secs).map_err(|_| {
            CheckError::InvalidConfigValueError {
                field: "hold".to_string(),
                value: hold_secs.to_string(),
                reason: "Hold must be zero or a positive number of seconds".to_string(),
            }
        })?;

        let primary = Endpoint::new(
            config.host(),
            config.port(),
            config.client_id(),
            handshake_timeout,
        )?;

        let mut probes = vec![ProbeTarget::for_endpoint(
            primary.with_timeout(probe_timeout)?,
        )];
        for &port in config.extra_probe_ports() {
            if probes.iter().any(|p| p.endpoint.port == port) {
                tracing::debug!("Skipping duplicate probe port {}", port);
                continue;
            }
            let endpoint = primary.with_port(port)?.with_timeout(probe_timeout)?;
            probes.push(ProbeTarget::for_endpoint(endpoint));
        }

        Ok(Self {
            primary,
            probes,
            hold,
        })
    }
}

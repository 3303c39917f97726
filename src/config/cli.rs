use crate::config::{
    DEFAULT_CLIENT_ID, DEFAULT_EXTRA_PROBE_PORT, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_HOLD_SECS,
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PROBE_TIMEOUT_SECS,
};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_port, validate_range, validate_timeout_secs, Validate,
    MAX_TIMEOUT_SECS,
};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "gateway-check")]
#[command(about = "Check that a local brokerage gateway accepts TCP and API connections")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port used for the API handshake (4002 = paper, 4001 = live)
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Additional ports to probe at the TCP level only
    #[arg(long, value_delimiter = ',', default_values_t = vec![DEFAULT_EXTRA_PROBE_PORT])]
    pub probe_ports: Vec<u16>,

    #[arg(long, default_value_t = DEFAULT_CLIENT_ID)]
    pub client_id: i32,

    /// TCP probe timeout in seconds
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_SECS)]
    pub probe_timeout: f64,

    /// API handshake timeout in seconds
    #[arg(long, default_value_t = DEFAULT_HANDSHAKE_TIMEOUT_SECS)]
    pub handshake_timeout: f64,

    /// Seconds to keep a successful session open before disconnecting
    #[arg(long, default_value_t = DEFAULT_HOLD_SECS)]
    pub hold: f64,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn extra_probe_ports(&self) -> &[u16] {
        &self.probe_ports
    }

    fn client_id(&self) -> i32 {
        self.client_id
    }

    fn probe_timeout_secs(&self) -> f64 {
        self.probe_timeout
    }

    fn handshake_timeout_secs(&self) -> f64 {
        self.handshake_timeout
    }

    fn hold_secs(&self) -> f64 {
        self.hold
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("--host", &self.host)?;
        validate_port("--port", self.port)?;
        for &port in &self.probe_ports {
            validate_port("--probe-ports", port)?;
        }
        validate_range("--client-id", self.client_id, 0, i32::MAX)?;
        validate_timeout_secs("--probe-timeout", self.probe_timeout)?;
        validate_timeout_secs("--handshake-timeout", self.handshake_timeout)?;
        validate_range("--hold", self.hold, 0.0, MAX_TIMEOUT_SECS)?;
        Ok(())
    }
}

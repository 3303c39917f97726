use crate::config::{
    DEFAULT_CLIENT_ID, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_HOLD_SECS, DEFAULT_HOST,
    DEFAULT_PROBE_TIMEOUT_SECS,
};
use crate::core::ConfigProvider;
use crate::utils::error::{CheckError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_port, validate_range, validate_required_field,
    validate_timeout_secs, Validate, MAX_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub handshake: HandshakeConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub name: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: Option<u16>,
    pub client_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub extra_ports: Vec<u16>,
    pub timeout_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandshakeConfig {
    pub timeout_seconds: Option<f64>,
    pub hold_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CheckError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CheckError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${IB_GATEWAY_PORT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CheckError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("gateway.host", &self.gateway.host)?;
        let port = validate_required_field("gateway.port", &self.gateway.port)?;
        validate_port("gateway.port", *port)?;

        if let Some(client_id) = self.gateway.client_id {
            validate_range("gateway.client_id", client_id, 0, i32::MAX)?;
        }

        for &extra in &self.probe.extra_ports {
            validate_port("probe.extra_ports", extra)?;
        }

        validate_timeout_secs("probe.timeout_seconds", self.probe_timeout_secs())?;
        validate_timeout_secs("handshake.timeout_seconds", self.handshake_timeout_secs())?;
        validate_range("handshake.hold_seconds", self.hold_secs(), 0.0, MAX_TIMEOUT_SECS)?;

        Ok(())
    }

    pub fn display_name(&self) -> &str {
        self.gateway.name.as_deref().unwrap_or("gateway")
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn host(&self) -> &str {
        &self.gateway.host
    }

    fn port(&self) -> u16 {
        // 0 is rejected by validate_config
        self.gateway.port.unwrap_or(0)
    }

    fn extra_probe_ports(&self) -> &[u16] {
        &self.probe.extra_ports
    }

    fn client_id(&self) -> i32 {
        self.gateway.client_id.unwrap_or(DEFAULT_CLIENT_ID)
    }

    fn probe_timeout_secs(&self) -> f64 {
        self.probe.timeout_seconds.unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS)
    }

    fn handshake_timeout_secs(&self) -> f64 {
        self.handshake
            .timeout_seconds
            .unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT_SECS)
    }

    fn hold_secs(&self) -> f64 {
        self.handshake.hold_seconds.unwrap_or(DEFAULT_HOLD_SECS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

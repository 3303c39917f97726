#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Gateway paper-trading API port.
pub const DEFAULT_PORT: u16 = 4002;
/// Gateway live-trading API port, probed but never logged into.
pub const DEFAULT_EXTRA_PROBE_PORT: u16 = 4001;
pub const DEFAULT_CLIENT_ID: i32 = 1;
pub const DEFAULT_PROBE_TIMEOUT_SECS: f64 = 5.0;
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: f64 = 15.0;
pub const DEFAULT_HOLD_SECS: f64 = 1.0;

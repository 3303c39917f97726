pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::GatewayClient;
pub use crate::core::{checker::ConnectivityChecker, engine::CheckEngine, CheckPlan};
pub use utils::error::{CheckError, Result};

use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Parameters for opening an API session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    pub timeout: Duration,
    pub readonly: bool,
}

/// The trading-API client the handshake is delegated to.
///
/// `disconnect` must be safe to call at any time, including when `connect` failed
/// half-way or was never called.
#[async_trait]
pub trait SessionClient: Send {
    async fn connect(&mut self, request: &ConnectRequest) -> Result<()>;

    fn is_connected(&self) -> bool;

    fn managed_accounts(&self) -> Vec<String>;

    fn server_version(&self) -> Option<i32> {
        None
    }

    fn connection_time(&self) -> Option<String> {
        None
    }

    async fn disconnect(&mut self);
}

pub trait ConfigProvider: Send + Sync {
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    /// Ports probed in addition to the primary one.
    fn extra_probe_ports(&self) -> &[u16];
    fn client_id(&self) -> i32;
    fn probe_timeout_secs(&self) -> f64;
    fn handshake_timeout_secs(&self) -> f64;
    fn hold_secs(&self) -> f64;
}

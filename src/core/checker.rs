use crate::core::{
    ConnectRequest, Endpoint, ProbeResult, ProbeTarget, SessionClient, SessionInfo, SessionState,
};
use crate::utils::error::{CheckError, Result};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Slack on top of the endpoint timeout before the checker stops waiting on the client.
pub const DEADLINE_GRACE: Duration = Duration::from_millis(250);

/// Two-stage reachability check: raw TCP probe, then API handshake.
///
/// The checker holds no connection state; every probe and handshake owns its socket or
/// session for the duration of the call only.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityChecker {
    hold: Duration,
}

impl ConnectivityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a successful session open for `hold` before tearing it down.
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// True iff a TCP connection to the endpoint completes within its timeout.
    pub async fn probe_socket(&self, endpoint: &Endpoint) -> bool {
        self.probe(endpoint).await.is_some()
    }

    pub async fn probe_all(&self, targets: &[ProbeTarget]) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(targets.len());

        for target in targets {
            let latency = self.probe(&target.endpoint).await;
            results.push(ProbeResult {
                label: target.label.clone(),
                host: target.endpoint.host.clone(),
                port: target.endpoint.port,
                open: latency.is_some(),
                latency,
            });
        }

        results
    }

    async fn probe(&self, endpoint: &Endpoint) -> Option<Duration> {
        let start = Instant::now();
        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));

        match timeout(endpoint.timeout, connect).await {
            Ok(Ok(_stream)) => {
                let elapsed = start.elapsed();
                tracing::debug!("TCP probe {} open ({:?})", endpoint.address(), elapsed);
                Some(elapsed)
            }
            Ok(Err(e)) => {
                tracing::debug!("TCP probe {} failed: {}", endpoint.address(), e);
                None
            }
            Err(_) => {
                tracing::debug!(
                    "TCP probe {} timed out after {:?}",
                    endpoint.address(),
                    endpoint.timeout
                );
                None
            }
        }
    }

    /// Opens a read-only API session, reads the account list and tears the session down.
    ///
    /// `client.disconnect()` is awaited on every path before this returns. If the returned
    /// future itself is dropped mid-flight, releasing the socket falls to the client's `Drop`.
    pub async fn attempt_handshake<C>(
        &self,
        client: &mut C,
        endpoint: &Endpoint,
    ) -> Result<SessionInfo>
    where
        C: SessionClient + ?Sized,
    {
        let mut lifecycle = Lifecycle::default();
        self.run_handshake(client, endpoint, &mut lifecycle).await
    }

    async fn run_handshake<C>(
        &self,
        client: &mut C,
        endpoint: &Endpoint,
        lifecycle: &mut Lifecycle,
    ) -> Result<SessionInfo>
    where
        C: SessionClient + ?Sized,
    {
        let request = ConnectRequest {
            host: endpoint.host.clone(),
            port: endpoint.port,
            client_id: endpoint.client_id,
            timeout: endpoint.timeout,
            readonly: true,
        };

        tracing::info!("Connecting to gateway at {}...", endpoint);
        lifecycle.advance(SessionState::Connecting);

        let guard = endpoint.timeout.saturating_add(DEADLINE_GRACE);
        let connected = match timeout(guard, client.connect(&request)).await {
            Ok(result) => result,
            Err(_) => Err(CheckError::HandshakeTimeout {
                address: endpoint.address(),
                timeout: endpoint.timeout,
            }),
        };

        let outcome = match connected {
            Ok(()) if client.is_connected() => {
                lifecycle.advance(SessionState::Connected);

                let info = SessionInfo {
                    connected: true,
                    accounts: client.managed_accounts(),
                    client_id: endpoint.client_id,
                    server_version: client.server_version(),
                    connection_time: client.connection_time(),
                };
                tracing::info!(
                    "Session established, account(s): {}",
                    info.accounts.join(", ")
                );

                if !self.hold.is_zero() {
                    tokio::time::sleep(self.hold).await;
                }

                lifecycle.advance(SessionState::Disconnecting);
                Ok(info)
            }
            Ok(()) => {
                lifecycle.advance(SessionState::Failed);
                Err(CheckError::HandshakeRejected {
                    code: None,
                    message: "client returned without an open session".to_string(),
                })
            }
            Err(e) => {
                tracing::warn!("Handshake with {} failed: {}", endpoint.address(), e);
                lifecycle.advance(SessionState::Failed);
                Err(e)
            }
        };

        // 無論成功或失敗都要斷線
        client.disconnect().await;
        lifecycle.advance(SessionState::Closed);
        debug_assert!(lifecycle.state.is_terminal());
        tracing::debug!(
            "Session with {} closed ({:?})",
            endpoint.address(),
            lifecycle.history
        );

        outcome
    }
}

#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    history: Vec<SessionState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
        }
    }
}

impl Lifecycle {
    fn advance(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid session transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!("session {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}

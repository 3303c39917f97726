use crate::core::checker::ConnectivityChecker;
use crate::core::plan::CheckPlan;
use crate::core::{CheckReport, HandshakeReport, SessionClient};
use chrono::Utc;

/// Runs probe → handshake for one `CheckPlan` and collects a `CheckReport`.
pub struct CheckEngine {
    checker: ConnectivityChecker,
}

impl CheckEngine {
    pub fn new(checker: ConnectivityChecker) -> Self {
        Self { checker }
    }

    pub fn for_plan(plan: &CheckPlan) -> Self {
        Self::new(ConnectivityChecker::new().with_hold(plan.hold))
    }

    pub async fn run<C: SessionClient + ?Sized>(
        &self,
        plan: &CheckPlan,
        client: &mut C,
    ) -> CheckReport {
        let checked_at = Utc::now();

        // Step 1: TCP
        tracing::info!(
            "📡 Probing {} TCP port(s) on {}",
            plan.probes.len(),
            plan.primary.host
        );
        let probes = self.checker.probe_all(&plan.probes).await;
        for probe in &probes {
            tracing::info!(
                "{} ({}): {}",
                probe.label,
                probe.port,
                if probe.open { "open" } else { "closed" }
            );
        }

        // Step 2: API handshake, only if the primary port answered
        let primary_open = probes.first().map(|p| p.open).unwrap_or(false);
        let handshake = if primary_open {
            let result = self.checker.attempt_handshake(client, &plan.primary).await;
            HandshakeReport::from_result(&result)
        } else {
            tracing::error!(
                "❌ Port {} is not accessible, skipping API handshake",
                plan.primary.port
            );
            HandshakeReport::Skipped {
                reason: format!(
                    "Port {} is not accepting connections; {}",
                    plan.primary.port,
                    "make sure the gateway container is running (docker compose ps)"
                ),
            }
        };

        CheckReport {
            checked_at,
            target: plan.primary.address(),
            probes,
            handshake,
        }
    }

    /// Handshake only, without probing any port first.
    pub async fn run_handshake_only<C: SessionClient + ?Sized>(
        &self,
        plan: &CheckPlan,
        client: &mut C,
    ) -> CheckReport {
        let checked_at = Utc::now();
        let result = self.checker.attempt_handshake(client, &plan.primary).await;

        CheckReport {
            checked_at,
            target: plan.primary.address(),
            probes: Vec::new(),
            handshake: HandshakeReport::from_result(&result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConnectRequest, Endpoint, ProbeTarget};
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct CountingClient {
        connected: bool,
        connect_calls: usize,
    }

    #[async_trait]
    impl SessionClient for CountingClient {
        async fn connect(&mut self, _request: &ConnectRequest) -> Result<()> {
            self.connect_calls += 1;
            self.connected = true;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn managed_accounts(&self) -> Vec<String> {
            vec!["DU7654321".to_string()]
        }

        async fn disconnect(&mut self) {
            self.connected = false;
        }
    }

    fn plan_for(primary_port: u16, extra: &[u16]) -> CheckPlan {
        let primary = Endpoint::new("127.0.0.1", primary_port, 1, Duration::from_secs(1)).unwrap();
        let mut probes = vec![ProbeTarget::new("primary", primary.clone())];
        for &port in extra {
            probes.push(ProbeTarget::new("extra", primary.with_port(port).unwrap()));
        }
        CheckPlan {
            primary,
            probes,
            hold: Duration::ZERO,
        }
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn test_closed_primary_skips_handshake() {
        let port = closed_port().await;
        let plan = plan_for(port, &[]);
        let mut client = CountingClient::default();

        let report = CheckEngine::for_plan(&plan).run(&plan, &mut client).await;

        assert_eq!(client.connect_calls, 0);
        assert!(matches!(report.handshake, HandshakeReport::Skipped { .. }));
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_closed_secondary_does_not_fail_run() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let closed = closed_port().await;
        let plan = plan_for(open_port, &[closed]);
        let mut client = CountingClient::default();

        let report = CheckEngine::for_plan(&plan).run(&plan, &mut client).await;

        assert_eq!(client.connect_calls, 1);
        assert!(!report.all_probes_open());
        assert!(report.is_success());
        assert_eq!(report.target, format!("127.0.0.1:{}", open_port));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_handshake_only_skips_probes() {
        let plan = plan_for(4002, &[4001]);
        let mut client = CountingClient::default();

        let report = CheckEngine::for_plan(&plan)
            .run_handshake_only(&plan, &mut client)
            .await;

        assert!(report.probes.is_empty());
        assert!(report.is_success());
        assert_eq!(client.connect_calls, 1);
    }
}

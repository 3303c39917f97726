use crate::core::{CheckReport, HandshakeReport};
use std::fmt::{self, Write};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

fn pass_fail(ok: bool) -> &'static str {
    if ok {
        "✅ Pass"
    } else {
        "❌ Fail"
    }
}

pub fn render_json(report: &CheckReport) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_text(report: &CheckReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_text(&mut out, report)?;
    Ok(out)
}

fn write_text(out: &mut String, report: &CheckReport) -> fmt::Result {
    writeln!(out, "🔍 Testing Gateway Connection ({})", report.target)?;
    writeln!(out, "{}", RULE)?;

    if !report.probes.is_empty() {
        writeln!(out)?;
        writeln!(out, "📡 Step 1: Testing TCP Socket Connectivity")?;
        writeln!(out, "{}", THIN_RULE)?;
        for probe in &report.probes {
            let status = if probe.open { "✅ Open" } else { "❌ Closed" };
            match probe.latency {
                Some(latency) => writeln!(
                    out,
                    "{:<28} {} ({:.1} ms)",
                    format!("{} ({}):", probe.label, probe.port),
                    status,
                    latency.as_secs_f64() * 1000.0
                )?,
                None => writeln!(
                    out,
                    "{:<28} {}",
                    format!("{} ({}):", probe.label, probe.port),
                    status
                )?,
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "🔌 Step 2: Testing API Protocol Connection")?;
    writeln!(out, "{}", THIN_RULE)?;
    match &report.handshake {
        HandshakeReport::Passed(info) => {
            writeln!(out, "✅ Connected successfully!")?;
            writeln!(out, "   Status: {}", info.connected)?;
            writeln!(out, "   Account(s): {}", info.accounts.join(", "))?;
            if let Some(version) = info.server_version {
                writeln!(out, "   Server version: {}", version)?;
            }
            if let Some(time) = &info.connection_time {
                writeln!(out, "   Connection time: {}", time)?;
            }
            writeln!(out, "   Disconnected.")?;
        }
        HandshakeReport::Failed { kind, message, .. } => {
            writeln!(out, "❌ Connection failed: {}: {}", kind, message)?;
        }
        HandshakeReport::Skipped { reason } => {
            writeln!(out, "⏭️  Skipped: {}", reason)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "📊 Test Summary")?;
    writeln!(out, "{}", RULE)?;
    if !report.probes.is_empty() {
        writeln!(out, "Socket Connectivity:  {}", pass_fail(report.all_probes_open()))?;
    }
    writeln!(out, "API Connection:       {}", pass_fail(report.handshake.passed()))?;
    writeln!(out, "{}", RULE)?;

    if report.is_success() {
        writeln!(out)?;
        writeln!(out, "🎉 All checks passed! The gateway is ready.")?;
    } else {
        writeln!(out)?;
        writeln!(out, "❌ API connection test failed.")?;
        writeln!(out)?;
        writeln!(out, "Troubleshooting:")?;
        if let HandshakeReport::Failed { suggestion, .. } = &report.handshake {
            writeln!(out, "• {}", suggestion)?;
        }
        writeln!(
            out,
            "• Check the gateway is fully initialized (wait 30-60 seconds after start)"
        )?;
        writeln!(out, "• Verify the API is enabled in the gateway GUI (via VNC)")?;
        writeln!(out, "• Restart the gateway if needed: docker compose restart")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProbeResult, SessionInfo};
    use chrono::Utc;
    use std::time::Duration;

    fn probe(label: &str, port: u16, open: bool) -> ProbeResult {
        ProbeResult {
            label: label.to_string(),
            host: "127.0.0.1".to_string(),
            port,
            open,
            latency: open.then(|| Duration::from_millis(2)),
        }
    }

    fn passed_report() -> CheckReport {
        CheckReport {
            checked_at: Utc::now(),
            target: "127.0.0.1:4002".to_string(),
            probes: vec![
                probe("Gateway paper trading", 4002, true),
                probe("Gateway live trading", 4001, false),
            ],
            handshake: HandshakeReport::Passed(SessionInfo {
                connected: true,
                accounts: vec!["DU1234567".to_string()],
                client_id: 1,
                server_version: Some(176),
                connection_time: Some("20261016 09:30:00 EST".to_string()),
            }),
        }
    }

    #[test]
    fn test_text_report_success() {
        let text = render_text(&passed_report()).unwrap();

        assert!(text.contains("Gateway paper trading (4002):"));
        assert!(text.contains("✅ Open"));
        assert!(text.contains("❌ Closed"));
        assert!(text.contains("Account(s): DU1234567"));
        assert!(text.contains("Socket Connectivity:  ❌ Fail"));
        assert!(text.contains("API Connection:       ✅ Pass"));
        assert!(text.contains("All checks passed"));
        assert!(!text.contains("Troubleshooting"));
    }

    #[test]
    fn test_text_report_failure_lists_suggestion() {
        let mut report = passed_report();
        report.handshake = HandshakeReport::Failed {
            kind: "handshake_rejected".to_string(),
            category: crate::utils::error::ErrorCategory::Protocol,
            message: "Gateway refused the API session: client id in use".to_string(),
            suggestion: "retry with a unique --client-id".to_string(),
        };

        let text = render_text(&report).unwrap();
        assert!(text.contains("❌ Connection failed: handshake_rejected"));
        assert!(text.contains("Troubleshooting:"));
        assert!(text.contains("• retry with a unique --client-id"));
    }

    #[test]
    fn test_json_report_shape() {
        let json = render_json(&passed_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["target"], "127.0.0.1:4002");
        assert_eq!(value["handshake"]["status"], "passed");
        assert_eq!(value["handshake"]["accounts"][0], "DU1234567");
        assert_eq!(value["probes"][1]["open"], false);
        assert!(value["probes"][1]["latency"].is_null());
    }
}

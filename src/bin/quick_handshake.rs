use clap::Parser;
use gateway_check::core::{ConfigProvider, HandshakeReport, EXIT_FAILURE, EXIT_SUCCESS};
use gateway_check::utils::{logger, validation::Validate};
use gateway_check::{CheckEngine, CheckPlan, GatewayClient};

/// Handshake-only check: connect, print the accounts, disconnect.
#[derive(Debug, Parser)]
#[command(name = "quick-handshake")]
struct Args {
    #[arg(long, default_value = gateway_check::config::DEFAULT_HOST)]
    host: String,

    #[arg(long, default_value_t = gateway_check::config::DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value_t = gateway_check::config::DEFAULT_CLIENT_ID)]
    client_id: i32,

    /// Handshake timeout in seconds
    #[arg(long, default_value_t = gateway_check::config::DEFAULT_HANDSHAKE_TIMEOUT_SECS)]
    timeout: f64,

    /// Seconds to stay connected before disconnecting
    #[arg(long, default_value_t = 2.0)]
    hold: f64,

    #[arg(short, long)]
    verbose: bool,
}

impl ConfigProvider for Args {
    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn extra_probe_ports(&self) -> &[u16] {
        &[]
    }

    fn client_id(&self) -> i32 {
        self.client_id
    }

    fn probe_timeout_secs(&self) -> f64 {
        self.timeout
    }

    fn handshake_timeout_secs(&self) -> f64 {
        self.timeout
    }

    fn hold_secs(&self) -> f64 {
        self.hold
    }
}

impl Validate for Args {
    fn validate(&self) -> gateway_check::Result<()> {
        CheckPlan::from_provider(self).map(|_| ())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_FAILURE } else { EXIT_SUCCESS };
            e.print()?;
            std::process::exit(code);
        }
    };
    logger::init_cli_logger(args.verbose);

    if let Err(e) = args.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(EXIT_FAILURE);
    }
    let plan = CheckPlan::from_provider(&args)?;

    println!("Connecting...");
    let mut client = GatewayClient::new();
    let report = CheckEngine::for_plan(&plan)
        .run_handshake_only(&plan, &mut client)
        .await;

    match &report.handshake {
        HandshakeReport::Passed(info) => {
            println!("✅ Connected! Status: {}", info.connected);
            println!("Account: {:?}", info.accounts);
            println!("Disconnected.");
        }
        HandshakeReport::Failed { kind, message, .. } => {
            println!("❌ Error: {}: {}", kind, message);
        }
        HandshakeReport::Skipped { reason } => {
            println!("❌ Skipped: {}", reason);
        }
    }

    std::process::exit(report.exit_code());
}

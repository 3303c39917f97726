use clap::Parser;
use gateway_check::app::report;
use gateway_check::core::{ConfigProvider, EXIT_FAILURE, EXIT_SUCCESS};
use gateway_check::utils::{logger, validation::Validate};
use gateway_check::{CheckEngine, CheckPlan, GatewayClient, TomlConfig};
use std::io::Write;

#[derive(Parser)]
#[command(name = "toml-check")]
#[command(about = "Gateway connectivity check driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "gateway-check.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override gateway.port from config
    #[arg(long)]
    port: Option<u16>,

    /// Override gateway.client_id from config
    #[arg(long)]
    client_id: Option<i32>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Dry run - show what would be checked without connecting
    #[arg(long)]
    dry_run: bool,
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

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(EXIT_FAILURE);
        }
    };

    // 初始化日誌
    logger::init(args.verbose || config.verbose(), config.log_json());
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(port) = args.port {
        config.gateway.port = Some(port);
        tracing::info!("🔧 Port overridden to: {}", port);
    }
    if let Some(client_id) = args.client_id {
        config.gateway.client_id = Some(client_id);
        tracing::info!("🔧 Client id overridden to: {}", client_id);
    }

    // 驗證配置
    let plan = match config
        .validate()
        .and_then(|_| CheckPlan::from_provider(&config))
    {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!(
                "❌ Configuration validation failed: {} (Severity: {:?})",
                e,
                e.severity()
            );
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(EXIT_FAILURE);
        }
    };

    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.dry_run {
        display_plan(&config, &plan);
        return Ok(());
    }

    let mut client = GatewayClient::new();
    let report = CheckEngine::for_plan(&plan).run(&plan, &mut client).await;

    if args.json {
        println!("{}", report::render_json(&report)?);
    } else {
        print!("{}", report::render_text(&report)?);
    }
    std::io::stdout().flush()?;

    std::process::exit(report.exit_code());
}

fn display_plan(config: &TomlConfig, plan: &CheckPlan) {
    println!("🔍 Dry Run: {}", config.display_name());
    println!();
    println!("📡 TCP probes:");
    for probe in &plan.probes {
        println!(
            "  {} -> {} (timeout {}s)",
            probe.label,
            probe.endpoint.address(),
            probe.endpoint.timeout.as_secs_f64()
        );
    }
    println!();
    println!("🔌 API handshake:");
    println!("  Target: {}", plan.primary.address());
    println!("  Client id: {}", config.client_id());
    println!("  Timeout: {}s", plan.primary.timeout.as_secs_f64());
    println!("  Hold before disconnect: {}s", plan.hold.as_secs_f64());
    println!();
    println!("✅ Dry run complete. No connections were opened.");
}

use clap::Parser;
use gateway_check::app::report;
use gateway_check::core::{EXIT_FAILURE, EXIT_SUCCESS};
use gateway_check::utils::{logger, validation::Validate};
use gateway_check::{CheckEngine, CheckPlan, CliConfig, GatewayClient};
use std::io::Write;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match CliConfig::try_parse() {
        Ok(config) => config,
        Err(e) => {
            // --help 也走這裡
            let code = if e.use_stderr() { EXIT_FAILURE } else { EXIT_SUCCESS };
            e.print()?;
            std::process::exit(code);
        }
    };

    // 初始化日誌
    logger::init(config.verbose, config.log_json);

    tracing::info!("Starting gateway-check");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    let plan = match config
        .validate()
        .and_then(|_| CheckPlan::from_provider(&config))
    {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!(
                "❌ Configuration validation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(EXIT_FAILURE);
        }
    };

    let mut client = GatewayClient::new();
    let report = CheckEngine::for_plan(&plan).run(&plan, &mut client).await;

    if config.json {
        println!("{}", report::render_json(&report)?);
    } else {
        print!("{}", report::render_text(&report)?);
    }
    std::io::stdout().flush()?;

    if report.is_success() {
        tracing::info!("✅ Gateway check passed");
    } else {
        tracing::error!("❌ Gateway check failed");
    }

    std::process::exit(report.exit_code());
}

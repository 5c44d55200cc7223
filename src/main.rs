use clap::Parser;
use review_builder::core::report::{self, OutputFormat};
use review_builder::core::ConfigProvider;
use review_builder::utils::error::ErrorSeverity;
use review_builder::utils::{logger, validation::Validate};
use review_builder::{
    AggregatedResult, CliConfig, LocalStorage, ReviewBuilder, ReviewError, TomlConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting review-builder");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    match run(&cli, &config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!(
                "❌ Review build failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }
    }
}

async fn run(cli: &CliConfig, config: &TomlConfig) -> Result<(), ReviewError> {
    let storage = LocalStorage::new(config.data_dir().to_string());
    let builder = ReviewBuilder::from_config(storage, config);

    let result = match cli.mode.build_mode() {
        Some(mode) => builder.build(mode).await?,
        None => {
            let result = builder.build_all().await?;
            tracing::info!("✅ All build modes produced identical results");
            result
        }
    };

    emit(&result, config).await
}

async fn emit(result: &AggregatedResult, config: &TomlConfig) -> Result<(), ReviewError> {
    let format: OutputFormat = config.output.format;

    match &config.output.path {
        Some(path) => {
            // 輸出路徑相對於工作目錄, 不是資料目錄
            let storage = LocalStorage::new(".".to_string());
            let written =
                report::write_report(&storage, path, result, format, config.output.pretty).await?;
            tracing::info!("📁 Report saved to: {} ({} bytes)", path, written);
        }
        None => {
            let bytes = report::render(result, format, config.output.pretty)?;
            println!("{}", String::from_utf8_lossy(&bytes));
        }
    }

    Ok(())
}

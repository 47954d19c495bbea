use anyhow::Context;
use clap::Parser;
use repost_lens::app::pipelines::{BatchOptions, BatchPipeline};
use repost_lens::config::{Cli, Command, LogFormat, Settings};
use repost_lens::utils::{logger, validation::validate_file_extension, validation::Validate};
use repost_lens::{Analyzer, AppState, BatchRunner, LensError, LocalStorage};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在時忽略
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };
    cli.command.apply_to(&mut settings);

    // 初始化日誌
    let serving = matches!(cli.command, Command::Serve { .. });
    if serving && settings.server.log_format == LogFormat::Json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("Settings loaded: {:?}", cli.config);

    let result = match cli.command {
        Command::Serve { .. } => serve(settings).await,
        Command::Batch {
            input,
            fetch_article,
            window,
            provider,
            ..
        } => {
            let input = std::path::absolute(&input)
                .with_context(|| format!("cannot resolve input path {}", input.display()))?;
            let options = BatchOptions {
                provider,
                fetch_article,
                window: window.into(),
            };
            batch(settings, input, options).await
        }
        Command::Sql { query } => {
            let today = chrono::Utc::now().date_naive();
            query
                .to_request()
                .render(&settings.query.table, today)
                .map(|sql| println!("{}", sql))
        }
    };

    if let Err(e) = result {
        tracing::error!("❌ {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings, LensError> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply_process_env()?;
    Ok(settings)
}

async fn serve(settings: Settings) -> Result<(), LensError> {
    settings.validate()?;
    tracing::info!(
        "Providers configured: {:?} (default: {})",
        settings.configured_providers(),
        settings.llm.provider
    );

    let analyzer = Analyzer::from_settings(&settings)?;
    repost_lens::server::serve(AppState::new(analyzer), &settings.server.host, settings.server.port).await
}

async fn batch(settings: Settings, input: PathBuf, options: BatchOptions) -> Result<(), LensError> {
    settings.validate()?;
    let input = input.to_string_lossy().to_string();
    validate_file_extension("input", &input, &["csv"])?;

    // 創建分析器、存儲和管道
    let analyzer = Analyzer::from_settings(&settings)?;
    let storage = LocalStorage::new(settings.batch.output_path.clone());
    let pipeline = BatchPipeline::new(
        storage,
        std::sync::Arc::new(analyzer),
        input,
        settings.batch.output_path.clone(),
    )
    .with_options(options);

    // 運行批次
    let output_path = BatchRunner::new(pipeline).run().await?;
    tracing::info!("✅ Batch completed successfully!");
    println!("✅ Batch completed successfully!");
    println!("📁 Output saved to: {}", output_path);
    Ok(())
}

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_audio_extractor::cli::normalize_legacy_flags;
use yt_audio_extractor::{
    Cli, Config, Console, ExternalTools, ExtractError, ExtractionPipeline, RunLog, RunOptions,
    StdinPrompt,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_legacy_flags(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version land here too and are not failures
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize tracing
    let default_filter = if cli.debug {
        "yt_audio_extractor=debug"
    } else {
        "yt_audio_extractor=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let style = console::Style::new().red().bright().for_stderr();
            eprintln!("{}", style.apply_to(format!("Error: {:#}", err)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    if cli.show_config {
        config.display();
        return Ok(());
    }

    let log = match &cli.log {
        Some(path) => {
            let log = RunLog::append_to(path).map_err(|e| {
                ExtractError::Configuration(format!(
                    "Cannot open log file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            println!("Logging enabled. Output will be saved to '{}'", path.display());
            log.record("--- Script started ---");
            log
        }
        None => RunLog::disabled(),
    };

    let options = match RunOptions::resolve(&cli, &config) {
        Ok(options) => options,
        Err(err) => {
            log.record(format!("ERROR: {}", err));
            return Err(err.into());
        }
    };
    options.prepare_destination()?;
    tracing::debug!("Resolved options: {:?}", options);

    let console = Console::detect(options.color, options.debug);
    let tools = ExternalTools::new(&config.tools, &options, &console, log.clone());
    if let Err(err) = tools.ensure_available().await {
        log.record(format!("CRITICAL: {}", err));
        return Err(err.into());
    }

    let pipeline = ExtractionPipeline::new(&options, &tools, &StdinPrompt, &console, log.clone());
    let summary = pipeline.run().await?;
    tracing::debug!(
        "Batch finished: {} converted, {} skipped, {} failed",
        summary.converted,
        summary.skipped,
        summary.failed
    );

    log.record("--- Script finished ---");
    Ok(())
}

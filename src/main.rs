use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ddms_meta::cli::{Cli, VerbosityLevel};
use ddms_meta::config::ConfigManager;
use ddms_meta::engine::Ddms;
use ddms_meta::file_discovery::FileDiscovery;
use ddms_meta::output::Output;
use ddms_meta::processor::DocumentProcessor;

fn init_tracing(verbosity: VerbosityLevel) {
    let default_level = match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ddms_meta={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    if let Err(message) = cli.validate() {
        bail!(message);
    }

    let config = ConfigManager::load_config(&cli)
        .await
        .context("Failed to load configuration")?;
    debug!(?config, "Configuration loaded");

    let engine = Arc::new(Ddms::from_config(&config).context("Failed to initialize DDMS engine")?);
    let discovery = FileDiscovery::new()
        .with_extensions(cli.get_extensions())
        .with_max_depth(cli.max_depth);
    let processor = DocumentProcessor::new(engine, cli.format).with_threads(cli.get_thread_count());

    let paths = cli.paths.clone();
    let results = tokio::task::spawn_blocking(move || {
        let files = discovery.discover_all(&paths)?;
        info!(files = files.len(), "Starting batch");
        processor.process_files(&files)
    })
    .await
    .context("Worker task panicked")??;

    let output = Output::new(cli.verbosity());
    print!("{}", output.format_results(&results));

    Ok(!results.has_errors())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbosity());

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

use clap::Parser;
use std::path::PathBuf;
use std::process;

mod config;
mod telemetry;

/// Relays form-builder webhooks to a downstream automation endpoint.
#[derive(Parser)]
#[command(name = "formrelay", version)]
struct Cli {
    /// Path to a YAML config file. Environment variables override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = match config::Config::load(cli.config.as_deref(), |name| std::env::var(name).ok())
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    let _sentry = telemetry::init_logging(&config.common.logging);

    if let Some(metrics) = &config.common.metrics
        && let Err(e) = telemetry::init_metrics(metrics)
    {
        tracing::error!(error = %e, "Failed to initialize metrics");
        process::exit(1);
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start runtime");
            process::exit(1);
        }
    };

    tracing::info!("Starting formrelay");
    if let Err(e) = rt.block_on(relay::run(config.server)) {
        tracing::error!(error = %e, "Relay stopped");
        process::exit(1);
    }
}

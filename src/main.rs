#![forbid(unsafe_code)]

mod cli;
mod commands;

use clap::Parser;
use tracing::{Level as TraceLevel, error};
use tracing_subscriber::FmtSubscriber;

use cli::Cli;
use mockgps_bridge::settings::BridgeSettings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Parse log level from environment variable
    let log_level = if cli.verbose {
        TraceLevel::DEBUG
    } else {
        match std::env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => TraceLevel::TRACE,
            "debug" => TraceLevel::DEBUG,
            "warn" => TraceLevel::WARN,
            "error" => TraceLevel::ERROR,
            _ => TraceLevel::INFO,
        }
    };

    // stdout carries command output, logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut settings = BridgeSettings::load()?;
    settings.apply_overrides(cli.config_path, cli.su);
    settings.validate()?;

    if let Err(err) = commands::run(cli.command, settings).await {
        error!(error = %format!("{err:#}"), "Command failed");
        std::process::exit(1);
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mockgps_bridge::constants::watch;

#[derive(Parser, Debug)]
#[command(
    name = "mockgps-bridge",
    version,
    about = "Read and write the MockGPS location config through su"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file on the device (overrides settings)")]
    pub config_path: Option<String>,
    #[arg(long, global = true, help = "su binary used for elevation (overrides settings)")]
    pub su: Option<String>,
    #[arg(short, long, global = true, help = "Log at debug level regardless of LOG_LEVEL")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the raw config text
    Read,
    /// Print the config as JSON
    Json,
    /// Print the typed location settings
    Show,
    /// Save config text from FILE, or stdin when omitted
    Save { file: Option<PathBuf> },
    /// Update individual keys
    Set {
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },
    /// Poll the config and print it whenever it changes
    Watch {
        #[arg(long, default_value_t = watch::DEFAULT_INTERVAL_SECS)]
        interval: u64,
    },
    /// Check su availability and whether elevation works
    Doctor,
    /// Print effective settings
    Settings {
        #[arg(long, default_value_t = false, help = "Persist the effective settings")]
        save: bool,
    },
}

pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }
    if value.contains('\n') {
        return Err(format!("value for {key} must be a single line"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("lat = 1.5").unwrap(),
            ("lat".to_string(), "1.5".to_string())
        );
        assert_eq!(
            parse_assignment("url=a=b").unwrap(),
            ("url".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=1").is_err());
    }

    #[test]
    fn test_cli_parses_set_and_globals() {
        let cli = Cli::try_parse_from([
            "mockgps-bridge",
            "--su",
            "/sbin/su",
            "set",
            "enabled=true",
            "lat=2",
        ])
        .unwrap();
        assert_eq!(cli.su.as_deref(), Some("/sbin/su"));
        match cli.command {
            Commands::Set { assignments } => assert_eq!(assignments.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_watch_default_interval() {
        let cli = Cli::try_parse_from(["mockgps-bridge", "watch"]).unwrap();
        assert!(matches!(cli.command, Commands::Watch { interval: 3 }));
    }
}

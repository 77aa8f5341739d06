//! Command handlers: the terminal stands in for the UI collaborator
//!
//! Privileged work goes through the `Dispatcher`; handlers only await the
//! worker handle and print what arrives on the result sink.

use anyhow::{Context, Result, bail};
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use mockgps_bridge::bridge::{BridgeEvent, ConfigBridge, Dispatcher, ResultSink};
use mockgps_bridge::codec;
use mockgps_bridge::location::LocationConfig;
use mockgps_bridge::privilege::{ShellCommand, SuChannel, privilege_status};
use mockgps_bridge::settings::BridgeSettings;

use crate::cli::Commands;

const EMPTY_JSON: &str = "{}";

pub async fn run(command: Commands, settings: BridgeSettings) -> Result<()> {
    let (sink, mut events) = ResultSink::channel();
    let channel = SuChannel::new(settings.su_binary.clone());
    let dispatcher = Dispatcher::new(ConfigBridge::new(channel, &settings, sink));

    match command {
        Commands::Read => {
            let text = dispatcher.run(|bridge| bridge.read_config()).await?;
            if !text.is_empty() {
                println!("{text}");
            }
        }
        Commands::Json => {
            let doc = dispatcher.run(|bridge| bridge.read_document()).await?;
            println!("{}", codec::to_json_projection(&doc));
        }
        Commands::Show => {
            let doc = dispatcher.run(|bridge| bridge.read_document()).await?;
            let location = LocationConfig::from_document(&doc);
            println!(
                "{}",
                serde_json::to_string_pretty(&location).context("Failed to render location")?
            );
        }
        Commands::Save { file } => {
            let text = read_input(file)?;
            let saved = dispatcher.dispatch_save(text).await?;
            drain_notices(&mut events);
            if !saved {
                bail!("config was not saved");
            }
        }
        Commands::Set { assignments } => {
            let saved = dispatcher
                .run(move |bridge| {
                    let mut doc = bridge.read_document();
                    for (key, value) in assignments {
                        doc.set(key, value);
                    }
                    bridge.write_document(&doc)
                })
                .await?;
            if !saved {
                bail!("config was not saved");
            }
            println!("{}", mockgps_bridge::constants::messages::SAVED);
        }
        Commands::Watch { interval } => watch(&dispatcher, &mut events, interval).await?,
        Commands::Doctor => doctor(&dispatcher, &settings).await?,
        Commands::Settings { save } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&settings).context("Failed to render settings")?
            );
            if save {
                let path = settings.save()?;
                info!(path = %path.display(), "Saved settings");
            }
        }
    }

    Ok(())
}

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .context(format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read config text from stdin")?;
            Ok(text)
        }
    }
}

fn drain_notices(events: &mut UnboundedReceiver<BridgeEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            BridgeEvent::Notice(message) => println!("{message}"),
            other => info!(event = ?other, "Bridge event"),
        }
    }
}

async fn watch(
    dispatcher: &Dispatcher<SuChannel>,
    events: &mut UnboundedReceiver<BridgeEvent>,
    interval: u64,
) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let mut last: Option<String> = None;
    info!(path = %dispatcher.bridge().config_path(), interval, "Watching config");

    loop {
        ticker.tick().await;
        dispatcher.dispatch_load().await?;
        let mut loaded = None;
        while let Ok(event) = events.try_recv() {
            if let BridgeEvent::ConfigLoaded { json } = event {
                loaded = Some(json);
            }
        }
        if let Some(json) = watch_update(&mut last, loaded) {
            println!("{json}");
        }
    }
}

/// What to print for one poll; `None` when nothing changed
///
/// No load event means the file is missing or empty, shown as `{}` once.
fn watch_update(last: &mut Option<String>, loaded: Option<String>) -> Option<String> {
    let current = loaded.unwrap_or_else(|| EMPTY_JSON.to_string());
    if last.as_deref() == Some(current.as_str()) {
        return None;
    }
    // Starting out with no config prints nothing
    let first_and_empty = last.is_none() && current == EMPTY_JSON;
    *last = Some(current.clone());
    (!first_and_empty).then_some(current)
}

async fn doctor(dispatcher: &Dispatcher<SuChannel>, settings: &BridgeSettings) -> Result<()> {
    let status = privilege_status();
    println!("running as root: {}", status.running_as_root);
    match &status.su_binary {
        Some(path) => println!("su found at: {}", path.display()),
        None => println!("su not found at any well-known location"),
    }
    println!("configured su: {}", settings.su_binary);
    println!("config path: {}", settings.config_path);

    let elevation = dispatcher
        .run(|bridge| {
            bridge
                .executor()
                .execute(&ShellCommand::program("id").token("-u"))
        })
        .await?;
    match elevation {
        Ok(uid) if uid == "0" => println!("elevation: ok"),
        Ok(uid) => {
            warn!(uid = %uid, "Elevated channel did not run as root");
            println!("elevation: channel runs as uid {uid}");
        }
        Err(err) => {
            println!("elevation: failed ({err})");
            bail!("root access required");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_update_reports_changes_once() {
        let mut last = None;
        assert_eq!(watch_update(&mut last, None), None);
        let json = r#"{"enabled":1}"#.to_string();
        assert_eq!(watch_update(&mut last, Some(json.clone())), Some(json.clone()));
        assert_eq!(watch_update(&mut last, Some(json)), None);
    }

    #[test]
    fn test_watch_update_reports_removed_config() {
        let mut last = Some(r#"{"enabled":1}"#.to_string());
        assert_eq!(watch_update(&mut last, None), Some("{}".to_string()));
        assert_eq!(watch_update(&mut last, None), None);
    }
}

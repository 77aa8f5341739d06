//! Read/write/notify operations consumed by the UI side
//!
//! Every failure of the elevated channel collapses to an empty document or
//! `false` here. The `try_*` variants keep the structured error for
//! diagnostics and tests.

mod dispatch;

pub use dispatch::Dispatcher;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::codec::{self, ConfigDocument};
use crate::privilege::{ExecError, PrivilegedChannel, PrivilegedExecutor, ShellCommand};
use crate::settings::BridgeSettings;

/// Results posted back to the UI context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Current document as a JSON projection
    ConfigLoaded { json: String },
    /// Write reached the device
    Saved,
    /// Write failed; the user needs to grant root
    RootRequired,
    /// User-facing message
    Notice(String),
}

/// Where the bridge posts its results
#[derive(Debug, Clone)]
pub struct ResultSink {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl ResultSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn post(&self, event: BridgeEvent) {
        if self.tx.send(event).is_err() {
            warn!("Result sink closed, dropping bridge event");
        }
    }
}

impl From<mpsc::UnboundedSender<BridgeEvent>> for ResultSink {
    fn from(tx: mpsc::UnboundedSender<BridgeEvent>) -> Self {
        Self { tx }
    }
}

pub struct ConfigBridge<C> {
    executor: PrivilegedExecutor<C>,
    config_path: String,
    file_mode: String,
    sink: ResultSink,
}

impl<C: PrivilegedChannel> ConfigBridge<C> {
    pub fn new(channel: C, settings: &BridgeSettings, sink: ResultSink) -> Self {
        Self {
            executor: PrivilegedExecutor::new(channel),
            config_path: settings.config_path.clone(),
            file_mode: settings.file_mode.clone(),
            sink,
        }
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    pub fn executor(&self) -> &PrivilegedExecutor<C> {
        &self.executor
    }

    /// Current document; empty on any failure, including a missing file
    pub fn read_document(&self) -> ConfigDocument {
        match self.try_read_document() {
            Ok(doc) => doc,
            Err(err) => {
                debug!(error = %err, path = %self.config_path, "Read degraded to empty document");
                ConfigDocument::new()
            }
        }
    }

    pub fn try_read_document(&self) -> Result<ConfigDocument, ExecError> {
        let text = self.read_raw()?;
        let (doc, skipped) = codec::parse_with_report(&text);
        if !skipped.is_empty() {
            debug!(lines = ?skipped, "Ignored config lines without '='");
        }
        Ok(doc)
    }

    /// Raw document text, `""` on any failure
    pub fn read_config(&self) -> String {
        self.read_raw().unwrap_or_default()
    }

    fn read_raw(&self) -> Result<String, ExecError> {
        let command = ShellCommand::program("cat")
            .arg(&self.config_path)
            .discard_stderr();
        self.executor.execute(&command)
    }

    /// Replace the file with `doc`; `false` when the channel reports failure
    pub fn write_document(&self, doc: &ConfigDocument) -> bool {
        match self.try_write_document(doc) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, path = %self.config_path, "Config write failed");
                false
            }
        }
    }

    pub fn try_write_document(&self, doc: &ConfigDocument) -> Result<(), ExecError> {
        // Nothing is sent when the file would not read back as `doc`
        doc.validate()
            .map_err(|err| ExecError::execution(None, format!("refusing to write: {err}")))?;
        let text = codec::serialize(doc);
        // printf supplies the final newline
        let payload = text.strip_suffix('\n').unwrap_or(&text);
        let command = ShellCommand::program("printf")
            .arg("%s\\n")
            .arg(payload)
            .redirect_to(&self.config_path)
            .and_then(
                ShellCommand::program("chmod")
                    .arg(&self.file_mode)
                    .arg(&self.config_path),
            );
        self.executor.execute(&command)?;
        info!(path = %self.config_path, entries = doc.len(), "Wrote config document");
        Ok(())
    }

    /// UI entry point: text as edited by the user
    pub fn save_config(&self, text: &str) -> bool {
        self.write_document(&codec::parse(text))
    }

    pub fn notify(&self, message: impl Into<String>) {
        self.sink.post(BridgeEvent::Notice(message.into()));
    }

    pub(crate) fn post(&self, event: BridgeEvent) {
        self.sink.post(event);
    }
}

//! Off-context execution of bridge operations
//!
//! Each call gets its own blocking task; there is no queue and no ordering
//! between concurrent calls. Results go to the bridge's `ResultSink`, and the
//! returned handle is only for callers that want to await completion.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{BridgeEvent, ConfigBridge};
use crate::codec;
use crate::constants::messages;
use crate::privilege::PrivilegedChannel;

pub struct Dispatcher<C> {
    bridge: Arc<ConfigBridge<C>>,
    runtime: Handle,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            bridge: Arc::clone(&self.bridge),
            runtime: self.runtime.clone(),
        }
    }
}

impl<C: PrivilegedChannel + 'static> Dispatcher<C> {
    /// Must be called from within a tokio runtime
    pub fn new(bridge: ConfigBridge<C>) -> Self {
        Self::with_handle(bridge, Handle::current())
    }

    pub fn with_handle(bridge: ConfigBridge<C>, runtime: Handle) -> Self {
        Self {
            bridge: Arc::new(bridge),
            runtime,
        }
    }

    pub fn bridge(&self) -> &ConfigBridge<C> {
        &self.bridge
    }

    /// Run `op` against the bridge on a blocking worker
    pub fn run<F, T>(&self, op: F) -> JoinHandle<T>
    where
        F: FnOnce(&ConfigBridge<C>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let bridge = Arc::clone(&self.bridge);
        self.runtime.spawn_blocking(move || op(&bridge))
    }

    /// Read the document and post its JSON projection
    ///
    /// Nothing is posted when the document is empty or unreadable.
    pub fn dispatch_load(&self) -> JoinHandle<()> {
        self.run(|bridge| {
            let doc = bridge.read_document();
            if doc.is_empty() {
                info!(path = %bridge.config_path(), "No config to load");
                return;
            }
            bridge.post(BridgeEvent::ConfigLoaded {
                json: codec::to_json_projection(&doc),
            });
        })
    }

    /// Save user-supplied text and post the outcome plus a notice
    pub fn dispatch_save(&self, text: String) -> JoinHandle<bool> {
        self.run(move |bridge| {
            let saved = bridge.save_config(&text);
            if saved {
                bridge.post(BridgeEvent::Saved);
                bridge.notify(messages::SAVED);
            } else {
                error!(path = %bridge.config_path(), "Config save failed, root access required");
                bridge.post(BridgeEvent::RootRequired);
                bridge.notify(messages::ROOT_REQUIRED);
            }
            saved
        })
    }
}

//! The extension environment a page talks to: shared storage plus a
//! registry of content-script tabs that can receive messages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
use tokio::sync::{mpsc, oneshot, Mutex};
use uuid::Uuid;

use crate::error::ExtensionError;
use crate::messages::{Message, Response};
use crate::settings::SettingsStore;

pub type TabId = Uuid;

/// A message in flight to a tab together with the channel for its reply.
pub struct Envelope {
    pub message: Message,
    pub reply: oneshot::Sender<Response>,
}

struct TabEntry {
    url: String,
    mailbox: mpsc::UnboundedSender<Envelope>,
}

struct RuntimeInner {
    store: Arc<SettingsStore>,
    valid: AtomicBool,
    tabs: Mutex<HashMap<TabId, TabEntry>>,
}

#[derive(Clone)]
pub struct ExtensionRuntime {
    inner: Arc<RuntimeInner>,
}

impl ExtensionRuntime {
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                store,
                valid: AtomicBool::new(true),
                tabs: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Shared settings, unless the extension context has been invalidated.
    pub fn storage(&self) -> Result<&SettingsStore, ExtensionError> {
        if self.is_valid() {
            Ok(self.inner.store.as_ref())
        } else {
            Err(ExtensionError::ContextInvalidated)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::SeqCst)
    }

    /// Simulates an extension reload under live pages.
    pub fn invalidate(&self) {
        self.inner.valid.store(false, Ordering::SeqCst);
    }

    pub async fn register_tab(&self, url: &str) -> (TabId, mpsc::UnboundedReceiver<Envelope>) {
        let id = Uuid::new_v4();
        let (mailbox, rx) = mpsc::unbounded_channel();
        self.inner.tabs.lock().await.insert(
            id,
            TabEntry {
                url: url.to_string(),
                mailbox,
            },
        );
        info!("Registered tab {id} ({url})");
        (id, rx)
    }

    pub async fn unregister_tab(&self, id: TabId) {
        if self.inner.tabs.lock().await.remove(&id).is_some() {
            info!("Unregistered tab {id}");
        }
    }

    /// Tabs whose url is on `host` or one of its subdomains.
    pub async fn query_tabs(&self, host: &str) -> Vec<TabId> {
        self.inner
            .tabs
            .lock()
            .await
            .iter()
            .filter(|(_, tab)| host_matches(&tab.url, host))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Deliver `message` to a tab and wait for its reply.
    pub async fn send_message(&self, tab: TabId, message: Message) -> Result<Response, ExtensionError> {
        if !self.is_valid() {
            return Err(ExtensionError::ContextInvalidated);
        }

        let (reply, response) = oneshot::channel();
        {
            let tabs = self.inner.tabs.lock().await;
            let entry = tabs.get(&tab).ok_or(ExtensionError::NoReceiver)?;
            entry
                .mailbox
                .send(Envelope { message, reply })
                .map_err(|_| ExtensionError::NoReceiver)?;
        }

        response.await.map_err(|_| ExtensionError::NoReceiver)
    }
}

/// `*://*.<host>/*` style match on a url string.
pub fn host_matches(url: &str, host: &str) -> bool {
    let Some((_, rest)) = url.split_once("://") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let hostname = authority.split(':').next().unwrap_or_default();
    hostname == host || hostname.ends_with(&format!(".{host}"))
}

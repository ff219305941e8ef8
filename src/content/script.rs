use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::ExtensionError;
use crate::messages::{Message, Response};
use crate::page::{Page, StatusBadge};
use crate::reconciler::{reconcile, PassContext, PassReport};
use crate::runtime::{Envelope, ExtensionRuntime, TabId};
use crate::settings::{Configuration, StorageChange};
use crate::timer::TimerMode;

use super::debounce::{MutationDebouncer, DEFAULT_DEBOUNCE};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone)]
pub struct ContentScriptOptions {
    /// Pause before the first pass so the host page can build its layout
    pub init_delay: Duration,
    /// Quiet period after a page mutation before reconciling
    pub debounce: Duration,
    pub url: String,
}

impl Default for ContentScriptOptions {
    fn default() -> Self {
        Self {
            init_delay: Duration::from_millis(500),
            debounce: DEFAULT_DEBOUNCE,
            url: "https://www.youtube.com/".into(),
        }
    }
}

/// Timer and enabled flags pushed by the popup with `updateTimer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerOverride {
    timer_running: bool,
    timer_mode: TimerMode,
    enabled: bool,
}

/// The per-tab half of the extension. Every trigger (initial load, page
/// mutations, settings changes, popup messages, badge clicks) ends in the
/// same reconciliation pass; the page lock keeps passes from interleaving.
pub struct ContentScript<P: Page> {
    tab_id: TabId,
    runtime: ExtensionRuntime,
    page: Mutex<P>,
    /// Holds until storage itself rewrites one of the flags
    timer_override: Mutex<Option<TimerOverride>>,
    debouncer: MutationDebouncer,
    shutdown: CancellationToken,
}

impl<P: Page> ContentScript<P> {
    /// Install the status badge, run the first pass and start listening for
    /// settings changes and popup messages.
    pub async fn attach(
        runtime: ExtensionRuntime,
        page: P,
        options: ContentScriptOptions,
    ) -> Result<Arc<Self>, ExtensionError> {
        if !options.init_delay.is_zero() {
            tokio::time::sleep(options.init_delay).await;
        }

        let store = runtime.storage()?;
        let config = store.get().await;
        let changes = store.subscribe();
        let (tab_id, mailbox) = runtime.register_tab(&options.url).await;

        let script = Arc::new(Self {
            tab_id,
            runtime,
            page: Mutex::new(page),
            timer_override: Mutex::new(None),
            debouncer: MutationDebouncer::new(options.debounce),
            shutdown: CancellationToken::new(),
        });

        {
            let mut page = script.page.lock().await;
            page.install_status_badge();
            reconcile(&mut *page, &PassContext::from_config(&config));
        }

        script.spawn_storage_listener(changes);
        script.spawn_message_loop(mailbox);
        log_info!("Content script attached to tab {} ({})", tab_id, options.url);

        Ok(script)
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    /// Run `f` against the page under the pass lock.
    pub async fn with_page<R>(&self, f: impl FnOnce(&mut P) -> R) -> R {
        let mut page = self.page.lock().await;
        f(&mut *page)
    }

    async fn apply(&self, ctx: PassContext) -> PassReport {
        let mut page = self.page.lock().await;
        reconcile(&mut *page, &ctx)
    }

    async fn context_for(&self, config: &Configuration) -> PassContext {
        let ctx = PassContext::from_config(config);
        match *self.timer_override.lock().await {
            Some(o) => ctx.with_timer(o.timer_running, o.timer_mode, o.enabled),
            None => ctx,
        }
    }

    /// Fetch the settings, then reconcile the page against them and the last
    /// `updateTimer` flags.
    pub async fn reconcile_now(&self) -> Result<PassReport, ExtensionError> {
        let config = self.runtime.storage()?.get().await;
        let ctx = self.context_for(&config).await;
        Ok(self.apply(ctx).await)
    }

    /// Page reported `added_nodes` insertions. Schedules one debounced pass;
    /// returns false when the batch was empty or folded into a pending pass.
    pub fn notify_mutations(self: &Arc<Self>, added_nodes: usize) -> bool {
        if added_nodes == 0 {
            return false;
        }
        let script = Arc::clone(self);
        self.debouncer.schedule(async move {
            script.run_background_pass().await;
        })
    }

    /// Badge click: flip `extensionEnabled` through storage, then reconcile.
    /// Drops any flags pushed by `updateTimer`.
    pub async fn on_status_click(&self) -> Result<PassReport, ExtensionError> {
        let store = match self.runtime.storage() {
            Ok(store) => store,
            Err(err) => {
                self.report_failure(&err).await;
                return Err(err);
            }
        };

        // The click flips what the badge currently shows.
        let pushed = self.timer_override.lock().await.take();
        let enabled = match pushed {
            Some(o) => o.enabled,
            None => store.get().await.extension_enabled,
        };
        if let Err(err) = store.update(|config| config.extension_enabled = !enabled).await {
            log_error!("Storage error: {err:#}");
            return Err(err.into());
        }

        self.reconcile_now().await
    }

    pub async fn handle_message(&self, message: Message) -> Response {
        let result = match message {
            Message::UpdateUi => self.reconcile_now().await,
            Message::UpdateTimer {
                timer_running,
                timer_mode,
                enabled,
            } => {
                *self.timer_override.lock().await = Some(TimerOverride {
                    timer_running,
                    timer_mode,
                    enabled,
                });
                self.reconcile_now().await
            }
            Message::GetModelStatus => return Response::model_status(false),
        };

        match result {
            Ok(_) => Response::ok(),
            Err(err) => {
                self.report_failure(&err).await;
                Response::failed(err.to_string())
            }
        }
    }

    /// Stop background work and leave the tab registry.
    pub async fn detach(&self) {
        self.shutdown.cancel();
        self.debouncer.shutdown();
        self.runtime.unregister_tab(self.tab_id).await;
    }

    async fn run_background_pass(&self) {
        if let Err(err) = self.reconcile_now().await {
            self.report_failure(&err).await;
        }
    }

    async fn report_failure(&self, err: &ExtensionError) {
        if err.is_context_invalidated() {
            log_warn!("Extension context invalidated; asking for a page refresh");
            self.page
                .lock()
                .await
                .render_status_badge(&StatusBadge::refresh_prompt());
        } else {
            log_error!("Reconciliation failed: {err}");
        }
    }

    fn spawn_storage_listener(self: &Arc<Self>, mut changes: broadcast::Receiver<StorageChange>) {
        let script = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = script.shutdown.cancelled() => break,
                    change = changes.recv() => {
                        match change {
                            Ok(change) if change.affects_page() => {
                                if change.affects_timer() {
                                    *script.timer_override.lock().await = None;
                                }
                                if script.runtime.is_valid() {
                                    let ctx = script.context_for(&change.new).await;
                                    script.apply(ctx).await;
                                } else {
                                    script.report_failure(&ExtensionError::ContextInvalidated).await;
                                }
                            }
                            Ok(_) => {}
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                log_warn!("Missed {} settings changes; reconciling from storage", skipped);
                                script.run_background_pass().await;
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        });
    }

    fn spawn_message_loop(self: &Arc<Self>, mut mailbox: mpsc::UnboundedReceiver<Envelope>) {
        let script = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = script.shutdown.cancelled() => break,
                    envelope = mailbox.recv() => {
                        let Some(envelope) = envelope else { break };
                        let response = script.handle_message(envelope.message).await;
                        // The sender may have given up waiting.
                        let _ = envelope.reply.send(response);
                    }
                }
            }
        });
    }
}

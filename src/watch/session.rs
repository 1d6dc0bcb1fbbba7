// src/watch/session.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::Runner;
use crate::errors::Result;
use crate::graph::TaskName;
use crate::serve::ReloadHub;
use crate::watch::patterns::{build_watch_profiles, WatchBinding};
use crate::watch::queue::TriggerQueue;
use crate::watch::watcher::spawn_watcher;

/// Events consumed by a [`WatchSession`].
///
/// - the watcher sends `Triggered`
/// - the debounce timer sends `Flush`
/// - a finished rebuild sends `RunFinished`
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Triggered { target: TaskName, path: String },
    Flush,
    RunFinished { targets: Vec<TaskName>, ok: bool },
    ShutdownRequested,
}

/// Turns file triggers into rebuilds, one rebuild at a time.
///
/// Triggers are held for `debounce` so a burst of editor events becomes a
/// single rebuild. Triggers arriving while a rebuild runs are coalesced and
/// run right after it.
pub struct WatchSession {
    runner: Runner,
    queue: TriggerQueue,
    debounce: Duration,
    hub: Option<ReloadHub>,

    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,

    running: bool,
    flush_pending: bool,
}

impl WatchSession {
    pub fn new(runner: Runner, debounce: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        Self {
            runner,
            queue: TriggerQueue::new(),
            debounce,
            hub: None,
            events_tx,
            events_rx,
            running: false,
            flush_pending: false,
        }
    }

    /// Notify `hub` after every successful rebuild.
    pub fn with_reload_hub(mut self, hub: ReloadHub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// A sender for feeding events into this session.
    pub fn sender(&self) -> mpsc::Sender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Main event loop. Returns after [`SessionEvent::ShutdownRequested`].
    ///
    /// A rebuild still in flight at shutdown is left to finish on the
    /// runtime; nothing waits for it.
    pub async fn run(mut self) -> Result<()> {
        info!("watch session started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "session received event");

            match event {
                SessionEvent::Triggered { target, path } => {
                    info!(target_name = %target, path = %path, "change detected");
                    self.queue.record_trigger(&target);
                    if !self.running && !self.flush_pending {
                        self.schedule_flush();
                    }
                }
                SessionEvent::Flush => {
                    self.flush_pending = false;
                    if !self.running {
                        self.start_rebuild();
                    }
                }
                SessionEvent::RunFinished { targets, ok } => {
                    self.running = false;
                    if ok {
                        info!(?targets, "rebuild finished");
                        if let Some(hub) = &self.hub {
                            hub.notify();
                        }
                    } else {
                        warn!(?targets, "rebuild finished with failures; browser not reloaded");
                    }
                    if !self.queue.is_empty() {
                        debug!(queued = self.queue.len(), "running coalesced triggers");
                        self.start_rebuild();
                    }
                }
                SessionEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping watch session");
                    break;
                }
            }
        }

        info!("watch session exiting");
        Ok(())
    }

    fn schedule_flush(&mut self) {
        self.flush_pending = true;
        let tx = self.events_tx.clone();
        let delay = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionEvent::Flush).await;
        });
    }

    fn start_rebuild(&mut self) {
        let targets = self.queue.drain_pending();
        if targets.is_empty() {
            return;
        }
        self.running = true;

        let runner = self.runner.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let mut ok = true;
            for target in &targets {
                if let Err(err) = runner.run(target).await {
                    error!(target_name = %target, error = %err, "rebuild failed");
                    ok = false;
                }
            }
            let _ = tx.send(SessionEvent::RunFinished { targets, ok }).await;
        });
    }
}

/// Watch the runner's project root and re-run bound targets on change until
/// Ctrl-C.
pub async fn watch(
    runner: Runner,
    bindings: &[WatchBinding],
    debounce: Duration,
    hub: Option<ReloadHub>,
) -> Result<()> {
    if bindings.is_empty() {
        warn!("no [[watch]] bindings configured; nothing will be rebuilt");
    }

    let profiles = build_watch_profiles(bindings)?;
    let root = runner.root().to_path_buf();

    let mut session = WatchSession::new(runner, debounce);
    if let Some(hub) = hub {
        session = session.with_reload_hub(hub);
    }

    let _watcher_handle = spawn_watcher(root, profiles, session.sender())?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = session.sender();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(SessionEvent::ShutdownRequested).await;
        });
    }

    session.run().await
}

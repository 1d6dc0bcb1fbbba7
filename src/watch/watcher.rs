// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::errors::{PipelineError, Result};
use crate::pipeline::source::relative_str;
use crate::watch::patterns::WatchProfile;
use crate::watch::session::SessionEvent;

/// Keeps the underlying `notify` watcher alive; dropping it stops watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and send a [`SessionEvent::Triggered`] for every
/// profile matching a changed path.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profiles: Vec<WatchProfile>,
    session_tx: mpsc::Sender<SessionEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    let profiles = Arc::new(profiles);

    // notify calls back on its own thread; bridge into async.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("assetpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => eprintln!("assetpipe: file watch error: {err}"),
        },
        Config::default(),
    )
    .map_err(|e| PipelineError::Other(e.into()))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| PipelineError::Other(e.into()))?;

    info!("file watcher started on {:?}", root);

    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_content_change(&event.kind) {
                trace!(kind = ?event.kind, "ignoring non-content event");
                continue;
            }
            debug!("received notify event: {:?}", event);

            for path in &event.paths {
                let Some(rel_str) = relative_str(&async_root, path) else {
                    warn!("could not relativize path {:?} against root {:?}", path, async_root);
                    continue;
                };

                for profile in profiles.iter().filter(|p| p.matches(&rel_str)) {
                    let sent = session_tx
                        .send(SessionEvent::Triggered {
                            target: profile.target().to_string(),
                            path: rel_str.clone(),
                        })
                        .await;
                    if sent.is_err() {
                        debug!("session channel closed; stopping watcher loop");
                        return;
                    }
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

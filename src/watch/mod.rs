// src/watch/mod.rs

//! Watch mode.
//!
//! Compiles `[[watch]]` glob bindings, turns `notify` events into target
//! triggers and runs a [`WatchSession`] that rebuilds one batch at a time.
//! It knows nothing about how targets run; that is the
//! [`Runner`](crate::engine::Runner)'s job.

pub mod patterns;
pub mod queue;
pub mod session;
pub mod watcher;

pub use patterns::{bindings_from_config, build_watch_profiles, WatchBinding, WatchProfile};
pub use queue::TriggerQueue;
pub use session::{watch, SessionEvent, WatchSession};
pub use watcher::{spawn_watcher, WatcherHandle};

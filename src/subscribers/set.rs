//! # SubscriberSet: in-process subscribers attached to the broadcaster.
//!
//! Each [`Subscribe`] implementation gets its own bounded slot on the
//! [`Broadcaster`], filtered by [`Subscribe::filter`], and a worker task that
//! feeds it entries one at a time.
//!
//! ```text
//!              Broadcaster::publish(entry)
//!                 │  (filter checked per slot)
//!     ┌───────────┼────────────────┐
//!     ▼           ▼                ▼
//! [ade-only]  [all bots]       [all bots]
//!     │           │                │
//!  worker      worker           worker ─► on_event()  (panics caught)
//! ```
//!
//! ## Rules
//! - Per-subscriber FIFO; no ordering across subscribers.
//! - A panic inside `on_event` is logged and the worker moves on to the next entry.
//! - [`SubscriberSet::drain`] closes every slot, then waits for the workers to
//!   finish what was already queued.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Subscribe;
use crate::events::{Broadcaster, LogEntry};

struct Worker {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// Workers of the in-process subscribers registered at build time.
pub struct SubscriberSet {
    broadcaster: Broadcaster,
    workers: Vec<Worker>,
}

impl SubscriberSet {
    /// Opens one slot per subscriber on `broadcaster` and spawns its worker.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn attach(broadcaster: &Broadcaster, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let workers = subs
            .into_iter()
            .map(|sub| {
                let name = sub.name();
                let rx = broadcaster.attach(name, sub.filter(), sub.queue_capacity());
                Worker {
                    name,
                    handle: tokio::spawn(feed(sub, rx)),
                }
            })
            .collect();

        Self {
            broadcaster: broadcaster.clone(),
            workers,
        }
    }

    /// Closes the slots and waits until every worker has drained its queue.
    pub async fn drain(self) {
        self.broadcaster.detach_subscribers();
        for worker in self.workers {
            if let Err(e) = worker.handle.await {
                tracing::warn!(subscriber = worker.name, error = %e, "subscriber worker aborted");
            }
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }
}

async fn feed(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<LogEntry>>) {
    while let Some(entry) = rx.recv().await {
        let call = AssertUnwindSafe(sub.on_event(entry.as_ref()));
        if let Err(panic) = call.catch_unwind().await {
            tracing::error!(
                subscriber = sub.name(),
                seq = entry.seq,
                panic = %panic_message(panic.as_ref()),
                "subscriber panicked"
            );
        }
    }
}

fn panic_message(any: &(dyn Any + Send)) -> String {
    any.downcast_ref::<&'static str>()
        .map(|s| (*s).to_string())
        .or_else(|| any.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

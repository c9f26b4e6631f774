//! # Broadcaster for live session log entries.
//!
//! [`Broadcaster`] decouples "a lifecycle event happened" from "N observers
//! want a live, filtered tail of it". Every observer owns a queue; the
//! broadcaster keeps one slot per queue together with its bot-name filter.
//!
//! ## Architecture
//! ```text
//! Publishers (one actor per session):         Slots (filter applied here):
//!   SessionActor ade ──┐                  ┌──► [None ] unbounded ─► LogTail
//!   SessionActor bob ──┼──► publish() ────┼──► [ade  ] unbounded ─► LogTail
//!   SessionActor cat ──┘                  └──► [None ] bounded   ─► Subscribe worker
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits for a consumer.
//! - **No retention**: a slot only receives entries published after it was opened.
//! - **Lossless tails**: a tail's queue is unbounded, so it receives every
//!   matching entry however far behind it is polled.
//! - **Bounded subscribers**: an in-process subscriber whose queue is full
//!   loses that entry (warned); other slots are unaffected.
//! - **Self-cleaning**: slots whose receiver is gone are pruned on publish.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use super::entry::LogEntry;
use super::tail::LogTail;

/// Default first line of every tail.
pub const DEFAULT_BANNER: &str = "Listen on logs stream.";

#[derive(Debug)]
enum Queue {
    Tail(mpsc::UnboundedSender<Arc<LogEntry>>),
    Subscriber {
        name: &'static str,
        tx: mpsc::Sender<Arc<LogEntry>>,
    },
}

#[derive(Debug)]
struct Slot {
    filter: Option<Arc<str>>,
    queue: Queue,
}

impl Slot {
    /// Delivers `entry` if it matches. Returns `false` once the receiver is gone.
    fn deliver(&self, entry: &Arc<LogEntry>) -> bool {
        if !entry.matches(self.filter.as_deref()) {
            return !self.is_closed();
        }
        match &self.queue {
            Queue::Tail(tx) => tx.send(Arc::clone(entry)).is_ok(),
            Queue::Subscriber { name, tx } => match tx.try_send(Arc::clone(entry)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber = *name,
                        seq = entry.seq,
                        bot = %entry.bot_name,
                        "subscriber dropped entry: queue full"
                    );
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            },
        }
    }

    fn is_closed(&self) -> bool {
        match &self.queue {
            Queue::Tail(tx) => tx.is_closed(),
            Queue::Subscriber { tx, .. } => tx.is_closed(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    banner: Arc<str>,
    slots: Mutex<Vec<Slot>>,
}

/// Publish/subscribe hub for [`LogEntry`] values.
///
/// Cheap to clone; every clone publishes into the same set of slots.
#[derive(Clone, Debug)]
pub struct Broadcaster {
    inner: Arc<Inner>,
}

impl Broadcaster {
    /// Creates a broadcaster whose tails open with [`DEFAULT_BANNER`].
    pub fn new() -> Self {
        Self::with_banner(DEFAULT_BANNER)
    }

    /// Creates a broadcaster whose tails open with `banner`.
    pub fn with_banner(banner: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                banner: banner.into(),
                slots: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Publishes an entry to every matching live slot.
    pub fn publish(&self, entry: LogEntry) {
        let entry = Arc::new(entry);
        self.slots().retain(|slot| slot.deliver(&entry));
    }

    /// Opens a live tail of rendered lines.
    ///
    /// - `filter`: only entries for this bot name (`None` = every bot);
    /// - `cancel`: ends the tail and detaches it from the broadcaster.
    ///
    /// The slot is opened eagerly, so every matching entry published after
    /// this call returns is observed even if the stream is polled later.
    pub fn subscribe(&self, filter: Option<&str>, cancel: CancellationToken) -> LogTail {
        let (tx, rx) = mpsc::unbounded_channel();
        self.slots().push(Slot {
            filter: filter.map(Arc::from),
            queue: Queue::Tail(tx),
        });
        LogTail::new(Arc::clone(&self.inner.banner), rx, cancel)
    }

    /// Number of open tails (closed ones are pruned first).
    pub fn tail_count(&self) -> usize {
        let mut slots = self.slots();
        slots.retain(|slot| !slot.is_closed());
        slots
            .iter()
            .filter(|slot| matches!(slot.queue, Queue::Tail(_)))
            .count()
    }

    /// Opens a bounded slot for an in-process subscriber.
    pub(crate) fn attach(
        &self,
        name: &'static str,
        filter: Option<&str>,
        capacity: usize,
    ) -> mpsc::Receiver<Arc<LogEntry>> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.slots().push(Slot {
            filter: filter.map(Arc::from),
            queue: Queue::Subscriber { name, tx },
        });
        rx
    }

    /// Closes every subscriber slot; their workers drain what is queued and exit.
    pub(crate) fn detach_subscribers(&self) {
        self.slots()
            .retain(|slot| matches!(slot.queue, Queue::Tail(_)));
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

//! # SessionActor: lifecycle driver of one registered session.
//!
//! Consumes the session's event queue and, for every event:
//! 1. persists the new run status (best-effort, under the handle's write gate),
//! 2. evicts the handle on `stop` / `logout`,
//! 3. publishes one [`LogEntry`] to the [`Broadcaster`].
//!
//! ## Transition table
//! ```text
//! Start            → waiting   "Waiting for users to scan the code"
//! Scan(qr, code)   → scaning   "Scan QR code is status(<code>) <qr>"
//! Stop             → stopped   "Bot stop."                  (evicts, actor exits)
//! Logout(user)     → logout    "Bot(<user>) logout."        (evicts, keeps draining)
//! Login(user)      → login     "Bot(<user>) login."
//! Error(err)       → failed    "<err>"                      (handle retained)
//! Message(msg)     → (no status change)
//! ```
//!
//! ## Rules
//! - Events are handled **sequentially** in queue order (FIFO per session).
//! - The emitting session never waits for this actor.
//! - A failed status write is logged and skipped: no retry, no rollback, and
//!   the entry is still published.
//! - A logged-out session may scan and log in again; its events keep
//!   updating the row even though the name is no longer registered.
//! - The actor exits after `stop`, when the queue closes, or when its
//!   cancellation token fires.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use super::registry::Registry;
use crate::events::{Broadcaster, EventKind, LogEntry};
use crate::session::SessionEvent;
use crate::store::RunStoreRef;
use crate::types::RunStatus;

/// Status change implied by a session event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Transition {
    pub status: RunStatus,
    pub message: String,
}

impl Transition {
    fn to(status: RunStatus, message: impl Into<String>) -> Option<Self> {
        Some(Self {
            status,
            message: message.into(),
        })
    }

    /// Maps an event to its persisted transition (`None` for messages).
    pub fn of(event: &SessionEvent) -> Option<Self> {
        match event {
            SessionEvent::Start => {
                Self::to(RunStatus::Waiting, "Waiting for users to scan the code")
            }
            SessionEvent::Scan { qrcode, status } => Self::to(
                RunStatus::Scanning,
                format!("Scan QR code is status({status}) {qrcode}"),
            ),
            SessionEvent::Stop => Self::to(RunStatus::Stopped, "Bot stop."),
            SessionEvent::Logout(user) => {
                Self::to(RunStatus::Logout, format!("Bot({}) logout.", user.name))
            }
            SessionEvent::Login(user) => {
                Self::to(RunStatus::Login, format!("Bot({}) login.", user.name))
            }
            SessionEvent::Error(err) => Self::to(RunStatus::Failed, err.message.clone()),
            SessionEvent::Message(_) => None,
        }
    }
}

/// Identity of the run an actor drives.
#[derive(Debug, Clone)]
pub(crate) struct ActorTarget {
    pub name: Arc<str>,
    pub run_id: i64,
    pub bot_id: i64,
    pub generation: u64,
}

/// Drives one session's lifecycle into persistence and the broadcaster.
pub(crate) struct SessionActor {
    target: ActorTarget,
    writes: Arc<Mutex<()>>,
    store: RunStoreRef,
    broadcaster: Broadcaster,
    registry: Arc<Registry>,
}

impl SessionActor {
    /// Creates a new actor.
    pub fn new(
        target: ActorTarget,
        writes: Arc<Mutex<()>>,
        store: RunStoreRef,
        broadcaster: Broadcaster,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            target,
            writes,
            store,
            broadcaster,
            registry,
        }
    }

    /// Runs until `stop`, queue closure, or cancellation.
    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<SessionEvent>, token: CancellationToken) {
        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                ev = rx.recv() => match ev {
                    Some(ev) => ev,
                    None => break,
                },
            };

            if self.handle(event).await {
                break;
            }
        }
        tracing::debug!(
            bot = %self.target.name,
            generation = self.target.generation,
            "session actor exited"
        );
    }

    /// Applies one event. Returns `true` once the session has stopped.
    async fn handle(&self, event: SessionEvent) -> bool {
        let entry = self.entry_for(&event);
        let transition = Transition::of(&event);
        let evicts = transition.as_ref().is_some_and(|t| t.status.evicts());
        let stopped = matches!(event, SessionEvent::Stop);

        if let SessionEvent::Error(err) = &event {
            tracing::error!(bot = %self.target.name, error = %err, "bot run failed");
        }

        if let Some(t) = transition {
            self.write_status(t).await;
        }
        if evicts {
            self.registry
                .evict(&self.target.name, self.target.generation)
                .await;
        }
        self.broadcaster.publish(entry);
        stopped
    }

    /// Best-effort status write; failures are logged only.
    async fn write_status(&self, t: Transition) {
        let _in_flight = self.writes.lock().await;
        match self
            .store
            .update_status(self.target.run_id, t.status, &t.message)
            .await
        {
            Ok(()) => {
                tracing::debug!(bot = %self.target.name, status = %t.status, "run status updated");
            }
            Err(e) => {
                tracing::error!(
                    bot = %self.target.name,
                    run_id = self.target.run_id,
                    status = %t.status,
                    error = %e,
                    label = e.as_label(),
                    "failed to persist run status"
                );
            }
        }
    }

    fn entry_for(&self, event: &SessionEvent) -> LogEntry {
        let (kind, message) = match event {
            SessionEvent::Start => (EventKind::Start, "started".to_string()),
            SessionEvent::Scan { qrcode, status } => (
                EventKind::Scan,
                format!("Scan QR Code to login: ScanStatus({status}) {qrcode}"),
            ),
            SessionEvent::Stop => (EventKind::Stop, "stopped".to_string()),
            SessionEvent::Logout(user) => (EventKind::Logout, format!("{} logged out", user.name)),
            SessionEvent::Login(user) => (EventKind::Login, format!("{} logged in", user.name)),
            SessionEvent::Error(err) => (EventKind::Error, err.message.clone()),
            SessionEvent::Message(msg) => (EventKind::Message, msg.describe()),
        };
        let entry = LogEntry::new(
            kind,
            self.target.bot_id,
            Arc::clone(&self.target.name),
            message,
        );
        match event {
            SessionEvent::Error(err) => match &err.stack {
                Some(stack) => entry.with_stack(stack.as_str()),
                None => entry,
            },
            _ => entry,
        }
    }
}

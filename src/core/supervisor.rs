//! # Supervisor: owns the live sessions, their lifecycle actors, and the log broadcaster.
//!
//! The [`Supervisor`] is the control plane for bot runs. It keeps at most one
//! live session per bot name, maps every session lifecycle event onto the
//! persisted run row, and publishes a log entry per event.
//!
//! ## Key responsibilities
//! - get-or-insert the run row of an enabled bot and instantiate its session
//! - register the session **before** starting it (per-name admission gate)
//! - spawn one [`SessionActor`] per session (FIFO status writes, eviction)
//! - answer `cancel` / `retrieve` / `online` from the persisted row and the handle table
//! - graceful shutdown with a configurable [`SupervisorConfig::grace`]
//!
//! ## High-level architecture
//! ```text
//! create(name):
//!   admit(name) ─┬─ handle exists ─► wait for in-flight write ─► re-read run
//!                └─ no handle ─► find run ─► (absent) bot enabled? ─► insert run (init)
//!                                  └─► provider.instantiate(run, EventSink)
//!                                        ├─ Err ─► log, return run (retryable)
//!                                        └─ Ok  ─► spawn SessionActor(rx, child token)
//!                                                  register(name, Handle)
//!                                                  spawn session.start()
//!
//! Event flow:
//!   Session ── EventSink (unbounded, never blocks) ──► SessionActor
//!                 ├─► RunStore::update_status   (best-effort, under write gate)
//!                 ├─► Registry::evict           (stop / logout)
//!                 └─► Broadcaster::publish ──► LogTail(s), SubscriberSet
//!
//! Shutdown path:
//!   shutdown() ─► drain registry ─► session.stop() for all
//!              └─► wait actors until grace deadline
//!                    ├─ all done  ─► Ok(())
//!                    └─ timeout   ─► cancel leftovers ─► GraceExceeded { stuck }
//!              └─► drain subscriber workers until the same deadline
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use puppetvisor::{
//!     EventSink, MemoryStore, ProviderError, Run, Session, SessionError,
//!     SessionProvider, SessionRef, Supervisor,
//! };
//!
//! struct Quiet;
//!
//! #[async_trait]
//! impl Session for Quiet {
//!     async fn start(&self) -> Result<(), SessionError> { Ok(()) }
//!     async fn stop(&self) -> Result<(), SessionError> { Ok(()) }
//!     async fn ready(&self) {}
//!     fn is_logged_in(&self) -> bool { false }
//! }
//!
//! struct Provider;
//!
//! impl SessionProvider for Provider {
//!     fn instantiate(&self, _run: &Run, _events: EventSink) -> Result<SessionRef, ProviderError> {
//!         Ok(Arc::new(Quiet))
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     store.add_bot("ade", true)?;
//!
//!     let sup = Supervisor::builder(Arc::new(Provider), store.clone(), store.clone()).build();
//!     let run = sup.create("ade").await?;
//!     assert_eq!(run.name, "ade");
//!     assert!(sup.is_registered("ade").await);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::actor::{ActorTarget, SessionActor};
use super::builder::SupervisorBuilder;
use super::config::SupervisorConfig;
use super::registry::{Handle, Registry};
use crate::error::{RunError, RuntimeError};
use crate::events::{Broadcaster, LogTail};
use crate::session::{EventSink, ProviderRef};
use crate::store::{BotStoreRef, RunStoreRef};
use crate::subscribers::SubscriberSet;
use crate::types::{NewRun, Run, RunStatus};

/// Message of the snapshot returned by a successful [`Supervisor::cancel`].
pub const STOPPED_MESSAGE: &str = "Bot run stopped";

/// Owns live bot sessions and keeps their run rows in sync.
pub struct Supervisor {
    cfg: SupervisorConfig,
    registry: Arc<Registry>,
    runs: RunStoreRef,
    bots: BotStoreRef,
    provider: ProviderRef,
    broadcaster: Broadcaster,
    subscribers: Mutex<Option<SubscriberSet>>,
    runtime_token: CancellationToken,
}

impl Supervisor {
    /// Creates a builder for a supervisor over the given provider and stores.
    pub fn builder(
        provider: ProviderRef,
        runs: RunStoreRef,
        bots: BotStoreRef,
    ) -> SupervisorBuilder {
        SupervisorBuilder::new(provider, runs, bots)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        provider: ProviderRef,
        runs: RunStoreRef,
        bots: BotStoreRef,
        broadcaster: Broadcaster,
        subscribers: Option<SubscriberSet>,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            registry: Registry::new(),
            runs,
            bots,
            provider,
            broadcaster,
            subscribers: Mutex::new(subscribers),
            runtime_token,
        }
    }

    /// Starts (or returns) the run of an enabled bot.
    ///
    /// - Registered name: returns the persisted run once the handle's in-flight
    ///   status write (if any) has landed. No new session is created.
    /// - Otherwise: gets the run row, or inserts an `init` row after rejecting
    ///   an absent or disabled bot with [`RunError::BotNotEnabled`], then
    ///   instantiates a session, registers it and starts it in the background.
    ///
    /// The returned run reflects the row as of registration; follow-up status
    /// changes arrive asynchronously through the session's events.
    pub async fn create(&self, name: &str) -> Result<Run, RunError> {
        let _admitted = self.registry.admit(name).await;

        if let Some(gate) = self.registry.write_gate(name).await {
            let _settled = gate.lock().await;
            return self
                .runs
                .find_by_name(name)
                .await?
                .ok_or_else(|| RunError::RunMissing {
                    name: name.to_string(),
                });
        }

        let run = self.get_or_create_run(name).await?;
        self.spawn_session(&run).await;
        Ok(run)
    }

    /// Stops the live session of `name` (if any) and reports the outcome.
    ///
    /// Always re-reads the persisted run; a missing row is
    /// [`RunError::RunNotFound`]. The returned run is a snapshot that is
    /// **not** persisted:
    /// - stop failed → status `failed` with the error text;
    /// - otherwise → status `stopped`, message `Bot run stopped`.
    ///
    /// The row itself becomes `stopped` when the session emits its `stop`
    /// event; callers poll [`retrieve`](Self::retrieve) for that.
    pub async fn cancel(&self, name: &str) -> Result<Run, RunError> {
        let stop_error = match self.registry.session(name).await {
            Some(session) => session.stop().await.err(),
            None => None,
        };

        let Some(run) = self.retrieve(name, true).await? else {
            return Err(RunError::RunNotFound {
                name: name.to_string(),
            });
        };

        match stop_error {
            Some(err) => {
                tracing::error!(bot = name, error = %err, "failed to stop session");
                Ok(run.snapshot(RunStatus::Failed, err.message))
            }
            None => Ok(run.snapshot(RunStatus::Stopped, STOPPED_MESSAGE)),
        }
    }

    /// Reads the persisted run of `name`.
    ///
    /// Absent row: [`RunError::RunNotFound`] when `reject_on_not_found`,
    /// `Ok(None)` otherwise.
    pub async fn retrieve(
        &self,
        name: &str,
        reject_on_not_found: bool,
    ) -> Result<Option<Run>, RunError> {
        match self.runs.find_by_name(name).await? {
            Some(run) => Ok(Some(run)),
            None if reject_on_not_found => Err(RunError::RunNotFound {
                name: name.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// True if `name` has a live session that reports a logged-in identity.
    ///
    /// Waits for the session's readiness before asking.
    pub async fn online(&self, name: &str) -> bool {
        match self.registry.session(name).await {
            Some(session) => {
                session.ready().await;
                session.is_logged_in()
            }
            None => false,
        }
    }

    /// Returns sorted names of all registered sessions.
    pub async fn list(&self) -> Vec<String> {
        self.registry.list().await
    }

    /// True if a session is registered for `name`.
    pub async fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name).await
    }

    /// The broadcaster every session's log entries go to.
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Opens a live log tail (see [`Broadcaster::subscribe`]).
    pub fn subscribe(&self, filter: Option<&str>, cancel: CancellationToken) -> LogTail {
        self.broadcaster.subscribe(filter, cancel)
    }

    /// Stops every registered session and waits for their lifecycle actors.
    ///
    /// Actors still running when [`SupervisorConfig::grace`] elapses are
    /// cancelled and their names returned in [`RuntimeError::GraceExceeded`].
    /// In-process subscribers then get until the same deadline to finish their
    /// queues. The supervisor is terminal afterwards: its runtime token is cancelled.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let handles = self.registry.drain().await;
        tracing::info!(sessions = handles.len(), ?grace, "shutdown requested");

        let deadline = Instant::now() + grace;
        let stops = handles.iter().map(|(name, h)| {
            let session = Arc::clone(&h.session);
            async move {
                if let Err(e) = session.stop().await {
                    tracing::error!(bot = %name, error = %e, "failed to stop session during shutdown");
                }
            }
        });
        let stopped_in_time = tokio::time::timeout_at(deadline, join_all(stops))
            .await
            .is_ok();

        let mut stuck = Vec::new();
        for (name, Handle { actor, cancel, .. }) in handles {
            if !stopped_in_time || tokio::time::timeout_at(deadline, actor).await.is_err() {
                cancel.cancel();
                stuck.push(name);
            }
        }
        self.runtime_token.cancel();

        let subscribers = self.subscribers.lock().await.take();
        if let Some(set) = subscribers {
            let workers = set.len();
            if tokio::time::timeout_at(deadline, set.drain()).await.is_err() {
                tracing::warn!(workers, "subscribers did not drain within grace");
            }
        }

        if stuck.is_empty() {
            tracing::info!("all sessions stopped within grace");
            return Ok(());
        }
        stuck.sort_unstable();
        let err = RuntimeError::GraceExceeded { grace, stuck };
        tracing::warn!(label = err.as_label(), "{}", err.as_message());
        Err(err)
    }

    /// Returns the existing run row, or inserts one for an enabled bot.
    ///
    /// The bot catalog is only consulted on the insert path: an existing row
    /// is returned as-is even if its bot has since been disabled.
    async fn get_or_create_run(&self, name: &str) -> Result<Run, RunError> {
        if let Some(run) = self.runs.find_by_name(name).await? {
            return Ok(run);
        }

        let bot = match self.bots.find_by_name(name).await? {
            Some(bot) if bot.enabled => bot,
            _ => {
                return Err(RunError::BotNotEnabled {
                    name: name.to_string(),
                })
            }
        };
        let run = self.runs.insert(NewRun::init(&bot)).await?;
        tracing::info!(bot = name, run_id = run.id, "run created");
        Ok(run)
    }

    /// Instantiates, registers and starts a session for `run`.
    ///
    /// Instantiation failures are logged and leave the name unregistered.
    async fn spawn_session(&self, run: &Run) {
        let name = run.name.as_str();
        let (sink, rx) = EventSink::channel();
        let session = match self.provider.instantiate(run, sink) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(bot = name, error = %e, label = e.as_label(), "failed to instantiate session");
                return;
            }
        };

        let generation = self.registry.next_generation();
        let writes = Arc::new(Mutex::new(()));
        let cancel = self.runtime_token.child_token();
        let actor = SessionActor::new(
            ActorTarget {
                name: Arc::from(name),
                run_id: run.id,
                bot_id: run.bot_id,
                generation,
            },
            Arc::clone(&writes),
            Arc::clone(&self.runs),
            self.broadcaster.clone(),
            Arc::clone(&self.registry),
        );
        let actor = tokio::spawn(actor.run(rx, cancel.clone()));

        let handle = Handle {
            session: Arc::clone(&session),
            generation,
            writes,
            actor,
            cancel,
        };
        if let Some(displaced) = self.registry.register(name, handle).await {
            displaced.cancel.cancel();
        }
        tracing::info!(bot = name, generation, "session registered");

        let registry = Arc::clone(&self.registry);
        let owned = name.to_string();
        tokio::spawn(async move {
            if let Err(e) = session.start().await {
                tracing::error!(bot = %owned, error = %e, label = e.as_label(), "failed to start session");
                registry.evict(&owned, generation).await;
            }
        });
    }
}

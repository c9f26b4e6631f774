//! # puppetvisor
//!
//! **Puppetvisor** supervises a fleet of chat-bot sessions ("puppets").
//!
//! It keeps at most one live session per bot, mirrors each session's
//! lifecycle into a persisted run row, and broadcasts a filterable live log
//! of everything that happens. Platform connectivity and persistence are
//! plugged in through traits; the crate itself owns only the orchestration.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐       ┌──────────────────────────────────────┐
//!     │    Fleet     │──────►│  Supervisor                          │
//!     │ dispatch()   │       │  - Registry (one handle per name)    │
//!     └──────────────┘       │  - SessionProvider (instantiate)     │
//!                            │  - RunStore / BotStore (ports)       │
//!                            │  - Broadcaster (log fan-out)         │
//!                            └──────┬─────────────────┬─────────────┘
//!                                   ▼                 ▼
//!                            ┌──────────────┐  ┌──────────────┐
//!                            │   Session    │  │   Session    │
//!                            │   (ade)      │  │   (bob)      │
//!                            └──────┬───────┘  └──────┬───────┘
//!                                   │ EventSink       │ EventSink
//!                                   ▼                 ▼
//!                            ┌──────────────┐  ┌──────────────┐
//!                            │ SessionActor │  │ SessionActor │
//!                            │ status write │  │ status write │
//!                            │ evict / log  │  │ evict / log  │
//!                            └──────┬───────┘  └──────┬───────┘
//!                                   ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │              Broadcaster (filter applied on publish)              │
//! │       (one queue per observer: tails unbounded, subs bounded)     │
//! └──────────┬────────────────────┬──────────────────────┬────────────┘
//!            ▼                    ▼                      ▼
//!     LogTail(None)        LogTail("ade")          SubscriberSet
//!     every bot            one bot                 (per-sub workers)
//!                                                        ▼
//!                                                    LogWriter ...
//! ```
//!
//! ### Lifecycle
//! ```text
//! init ──start──► waiting ──scan──► scaning ──login──► login ◄──┐
//!                                                      │       │
//!                                                   logout  login
//!                                                      ▼       │
//!                                                    logout ───┘ (handle evicted)
//! any ──stop──► stopped (handle evicted)
//! any ──error─► failed  (handle retained)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Create, cancel, inspect bot runs.                             | [`Supervisor`], [`SupervisorBuilder`]       |
//! | **Sessions**      | Plug in platform connectivity.                                | [`SessionProvider`], [`Session`], [`EventSink`] |
//! | **Persistence**   | Plug in run and bot storage.                                  | [`RunStore`], [`BotStore`], [`MemoryStore`] |
//! | **Live logs**     | Filterable, cancellable tails and in-process subscribers.     | [`Broadcaster`], [`LogTail`], [`Subscribe`] |
//! | **Fleet**         | Start or stop every enabled bot at once.                      | [`Fleet`], [`DispatchStats`]                |
//! | **Errors**        | Typed errors with stable labels.                              | [`RunError`], [`RuntimeError`]              |
//! | **Configuration** | Centralize runtime settings.                                  | [`SupervisorConfig`]                        |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], echoing every log entry to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//! use puppetvisor::{
//!     EventSink, MemoryStore, ProviderError, Run, Session, SessionError,
//!     SessionProvider, SessionRef, Supervisor,
//! };
//!
//! struct Echo { sink: EventSink }
//!
//! #[async_trait]
//! impl Session for Echo {
//!     async fn start(&self) -> Result<(), SessionError> { self.sink.start(); Ok(()) }
//!     async fn stop(&self) -> Result<(), SessionError> { self.sink.stop(); Ok(()) }
//!     async fn ready(&self) {}
//!     fn is_logged_in(&self) -> bool { false }
//! }
//!
//! struct EchoProvider;
//!
//! impl SessionProvider for EchoProvider {
//!     fn instantiate(&self, _run: &Run, events: EventSink) -> Result<SessionRef, ProviderError> {
//!         Ok(Arc::new(Echo { sink: events }))
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     store.add_bot("ade", true)?;
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn puppetvisor::Subscribe>> = vec![Arc::new(puppetvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn puppetvisor::Subscribe>> = Vec::new();
//!
//!     let sup = Supervisor::builder(Arc::new(EchoProvider), store.clone(), store.clone())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let mut tail = sup.subscribe(Some("ade"), CancellationToken::new());
//!     assert_eq!(tail.next().await.as_deref(), Some("Listen on logs stream."));
//!
//!     sup.create("ade").await?;
//!     let line = tail.next().await.unwrap_or_default();
//!     assert!(line.ends_with("[ade] started"));
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod fleet;
mod session;
mod store;
mod subscribers;
mod types;

// ---- Public re-exports ----

pub use crate::core::{Supervisor, SupervisorBuilder, SupervisorConfig, STOPPED_MESSAGE};
pub use error::{ProviderError, RunError, RuntimeError, SessionError, StoreError};
pub use events::{Broadcaster, EventKind, Level, LogEntry, LogTail, DEFAULT_BANNER};
pub use fleet::{Action, DispatchStats, Fleet};
pub use session::{
    EventSink, Identity, IncomingMessage, ProviderRef, Session, SessionEvent, SessionProvider,
    SessionRef,
};
pub use store::{BotStore, BotStoreRef, MemoryStore, RunStore, RunStoreRef};
pub use subscribers::{Subscribe, SubscriberSet};
pub use types::{Bot, NewRun, Run, RunStatus};

// Optional: expose the built-in tracing subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

//! Session log entries and their broadcaster.
//!
//! This module groups the log **data model** and the **broadcaster** used to
//! fan lifecycle log entries out to live observers.
//!
//! ## Contents
//! - [`EventKind`], [`Level`], [`LogEntry`] entry classification and payload
//! - [`Broadcaster`] publish-side filtered fan-out into per-observer queues
//! - [`LogTail`] filtered, cancellable stream of rendered lines
//!
//! ## Quick reference
//! - **Publishers**: one `SessionActor` per registered session.
//! - **Consumers**: any number of [`LogTail`]s (HTTP log streams, unbounded)
//!   and the in-process subscribers of a `SubscriberSet` (bounded).

mod broadcaster;
mod entry;
mod tail;

pub use broadcaster::{Broadcaster, DEFAULT_BANNER};
pub use entry::{EventKind, Level, LogEntry};
pub use tail::LogTail;

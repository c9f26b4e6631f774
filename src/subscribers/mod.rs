//! # In-process subscribers of the log broadcast.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out, and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! SessionActor ── publish(LogEntry) ──► Broadcaster
//!                                          │ one filtered, bounded slot each
//!                                ┌─────────┼─────────┐
//!                                ▼         ▼         ▼
//!                            LogWriter   Audit    Custom   (SubscriberSet workers)
//! ```
//!
//! HTTP-style log streams do not go through this module; they hold their
//! own [`LogTail`](crate::LogTail).

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

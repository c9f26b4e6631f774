//! # Session abstractions.
//!
//! This module provides the session-related types consumed by the supervisor:
//! - [`Session`] - trait for one live platform connection
//! - [`SessionProvider`] - factory creating sessions per run
//! - [`SessionEvent`] - lifecycle events a session raises
//! - [`EventSink`] - non-blocking emission surface handed to each session

mod event;
#[allow(clippy::module_inception)]
mod session;

pub use event::{EventSink, Identity, IncomingMessage, SessionEvent};
pub use session::{ProviderRef, Session, SessionProvider, SessionRef};

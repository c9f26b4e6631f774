//! # Session abstraction and provider contract.
//!
//! This module defines the [`Session`] trait (one live connection to the
//! messaging platform for one bot) and the [`SessionProvider`] that creates
//! sessions. The common handle type is [`SessionRef`], an `Arc<dyn Session>`
//! shared between the supervisor's handle table and its background tasks.
//!
//! Sessions report their lifecycle through the [`EventSink`] they were
//! created with, never through return values: `start()` resolving only means
//! the session was launched.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ProviderError, SessionError};
use crate::session::EventSink;
use crate::types::Run;

/// # One bot's connection to the messaging platform ("puppet").
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use puppetvisor::{EventSink, Session, SessionError};
///
/// struct Echo { sink: EventSink }
///
/// #[async_trait]
/// impl Session for Echo {
///     async fn start(&self) -> Result<(), SessionError> {
///         self.sink.start();
///         Ok(())
///     }
///     async fn stop(&self) -> Result<(), SessionError> {
///         self.sink.stop();
///         Ok(())
///     }
///     async fn ready(&self) {}
///     fn is_logged_in(&self) -> bool { false }
/// }
/// ```
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Launches the session. Must not emit events before it is called.
    async fn start(&self) -> Result<(), SessionError>;

    /// Requests shutdown. The `stop` event is emitted asynchronously.
    async fn stop(&self) -> Result<(), SessionError>;

    /// Resolves once the session is ready to report its login state.
    async fn ready(&self);

    /// True while an identity is attached.
    fn is_logged_in(&self) -> bool;
}

/// Shared handle to a session.
pub type SessionRef = Arc<dyn Session>;

/// Factory of sessions.
pub trait SessionProvider: Send + Sync + 'static {
    /// Creates (but does not start) a session for `run`.
    ///
    /// Every lifecycle event of the returned session must go through `events`.
    fn instantiate(&self, run: &Run, events: EventSink) -> Result<SessionRef, ProviderError>;
}

/// Shared handle to a provider.
pub type ProviderRef = Arc<dyn SessionProvider>;

//! Error types used by the puppetvisor runtime, its ports, and sessions.
//!
//! This module defines the error enums that cross component boundaries:
//!
//! - [`RunError`]: rejections surfaced by the run supervisor and fleet to API callers.
//! - [`StoreError`]: failures reported by a persistence port.
//! - [`ProviderError`]: a session provider could not instantiate a session.
//! - [`SessionError`]: a live session failed (start, stop, or at runtime).
//! - [`RuntimeError`]: errors raised by the supervisor runtime itself.
//!
//! All of them provide `as_label` (stable snake_case label for logs/metrics).
//! Only [`RunError`] is meant to reach an API boundary; session and provider
//! failures are absorbed into run status and log entries.

use std::time::Duration;
use thiserror::Error;

/// # Rejections produced by run operations.
///
/// These are the conditions the control-plane API propagates to callers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// The bot does not exist or is disabled.
    #[error("Bot({name}) does not exist or is not enabled")]
    BotNotEnabled {
        /// Bot name as requested.
        name: String,
    },

    /// No run row is persisted for this bot.
    #[error("Bot({name}) run object not found")]
    RunNotFound {
        /// Bot name as requested.
        name: String,
    },

    /// A session handle is registered but its run row is gone.
    #[error("Bot({name}) during run status missing")]
    RunMissing {
        /// Bot name as requested.
        name: String,
    },

    /// The persistence port failed while serving the call.
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use puppetvisor::RunError;
    ///
    /// let err = RunError::BotNotEnabled { name: "ade".into() };
    /// assert_eq!(err.as_label(), "run_bot_not_enabled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::BotNotEnabled { .. } => "run_bot_not_enabled",
            RunError::RunNotFound { .. } => "run_not_found",
            RunError::RunMissing { .. } => "run_missing",
            RunError::Store(_) => "run_store_failed",
        }
    }

    /// Returns the HTTP-class status code an API layer should answer with.
    ///
    /// Not-found conditions map to `503`; storage failures to `500`.
    pub fn status_code(&self) -> u16 {
        match self {
            RunError::BotNotEnabled { .. }
            | RunError::RunNotFound { .. }
            | RunError::RunMissing { .. } => 503,
            RunError::Store(_) => 500,
        }
    }

    /// True for the not-found family of rejections.
    pub fn is_not_found(&self) -> bool {
        !matches!(self, RunError::Store(_))
    }
}

/// # Errors produced by a persistence port.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row addressed by an update does not exist.
    #[error("row not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "store_unavailable",
            StoreError::Conflict(_) => "store_conflict",
            StoreError::NotFound(_) => "store_not_found",
        }
    }
}

/// # Session instantiation failure.
///
/// Returned by [`SessionProvider::instantiate`](crate::SessionProvider::instantiate).
/// The supervisor logs it and leaves the name unregistered, so the next
/// `create()` retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to instantiate session for '{name}': {reason}")]
pub struct ProviderError {
    /// Bot name the session was requested for.
    pub name: String,
    /// Provider-specific explanation.
    pub reason: String,
}

impl ProviderError {
    /// Creates a new provider error.
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "provider_instantiate_failed"
    }
}

/// # Failure raised by a live session.
///
/// Carries the message that ends up in the run row and an optional stack
/// that only travels with the broadcast log entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SessionError {
    /// Human-readable error text.
    pub message: String,
    /// Provider backtrace, when it has one.
    pub stack: Option<String>,
}

impl SessionError {
    /// Creates a session error without a stack.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// Attaches a stack trace.
    #[inline]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "session_failed"
    }
}

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some sessions did not report
    /// their stop in time and their lifecycle actors were cancelled.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Bot names whose sessions did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use puppetvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck sessions={stuck:?}")
            }
        }
    }
}

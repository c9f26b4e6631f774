//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging in-process handlers into
//! the log broadcast (audit sinks, metrics, notifications). Each subscriber is
//! driven by a dedicated worker loop fed by its own bounded slot on the
//! [`Broadcaster`](crate::Broadcaster), managed by the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) – they do **not** block
//!   the session actors nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, entries for that
//!   subscriber are **dropped** (warn).
//! - [`Subscribe::filter`] narrows the slot to one bot; non-matching entries
//!   never reach the queue.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use puppetvisor::{EventKind, LogEntry, Subscribe};
//!
//! struct LoginAudit;
//!
//! #[async_trait]
//! impl Subscribe for LoginAudit {
//!     async fn on_event(&self, entry: &LogEntry) {
//!         if entry.kind == EventKind::Login {
//!             // write audit record...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "login-audit" }
//!     fn filter(&self) -> Option<&str> { Some("ade") }
//! }
//! ```

use async_trait::async_trait;

use crate::events::LogEntry;

/// Contract for in-process log subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should
/// avoid blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single log entry.
    async fn on_event(&self, entry: &LogEntry);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, entries for this subscriber are **dropped** (warn).
    fn queue_capacity(&self) -> usize {
        1024
    }

    /// Bot name this subscriber is interested in (`None` = every bot).
    fn filter(&self) -> Option<&str> {
        None
    }
}

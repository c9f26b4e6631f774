//! # Log entries published for every session lifecycle event.
//!
//! The [`EventKind`] enum mirrors the events a session can raise. A
//! [`LogEntry`] carries the bot identity, severity, a human-readable message
//! and (for errors) the provider's stack.
//!
//! ## Ordering guarantees
//! Each entry has a globally unique sequence number (`seq`) that increases
//! monotonically. Entries for one bot are published in the order its session
//! raised the underlying events.
//!
//! ## Example
//! ```rust
//! use puppetvisor::{EventKind, Level, LogEntry};
//!
//! let entry = LogEntry::new(EventKind::Error, 1, "ade", "socket closed")
//!     .with_stack("at connect()");
//!
//! assert_eq!(entry.level, Level::Error);
//! assert!(entry.matches(Some("ade")));
//! assert!(!entry.matches(Some("bob")));
//! assert!(entry.line().ends_with("[ade] socket closed"));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use chrono::{DateTime, Local};

/// Global sequence counter for entry ordering.
static ENTRY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Format of the timestamp prefix of a rendered line.
const LINE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Session lifecycle event an entry was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Session started.
    Start,
    /// Challenge (QR code) pending.
    Scan,
    /// Session stopped.
    Stop,
    /// Identity logged out.
    Logout,
    /// Identity logged in.
    Login,
    /// Session raised an error.
    Error,
    /// Session received a chat message.
    Message,
}

impl EventKind {
    /// Short stable label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Scan => "scan",
            EventKind::Stop => "stop",
            EventKind::Logout => "logout",
            EventKind::Login => "login",
            EventKind::Error => "error",
            EventKind::Message => "message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// One broadcast log record.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Local wall-clock timestamp.
    pub at: DateTime<Local>,
    /// Id of the bot whose session produced the entry.
    pub bot_id: i64,
    /// Name of that bot; the key subscribers filter on.
    pub bot_name: Arc<str>,
    /// Originating lifecycle event.
    pub kind: EventKind,
    /// `Error` for [`EventKind::Error`], `Info` otherwise.
    pub level: Level,
    /// Human-readable text.
    pub message: Arc<str>,
    /// Provider stack, for errors that carry one.
    pub stack: Option<Arc<str>>,
}

impl LogEntry {
    /// Creates an entry stamped with the current time and the next sequence number.
    pub fn new(
        kind: EventKind,
        bot_id: i64,
        bot_name: impl Into<Arc<str>>,
        message: impl Into<Arc<str>>,
    ) -> Self {
        let level = match kind {
            EventKind::Error => Level::Error,
            _ => Level::Info,
        };
        Self {
            seq: ENTRY_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: Local::now(),
            bot_id,
            bot_name: bot_name.into(),
            kind,
            level,
            message: message.into(),
            stack: None,
        }
    }

    /// Attaches a stack trace.
    #[inline]
    pub fn with_stack(mut self, stack: impl Into<Arc<str>>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// True if this entry passes a subscriber's name filter (`None` = all).
    #[inline]
    pub fn matches(&self, filter: Option<&str>) -> bool {
        filter.map_or(true, |name| &*self.bot_name == name)
    }

    /// Renders the entry as `<time> [<bot>] <message>`.
    pub fn line(&self) -> String {
        format!(
            "{} [{}] {}",
            self.at.format(LINE_TIME_FORMAT),
            self.bot_name,
            self.message
        )
    }
}

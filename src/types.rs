//! # Bot and run records.
//!
//! [`Bot`] is the catalog entry owned by the bot store. [`Run`] is the
//! persisted record of one bot's most recent session lifecycle state, one
//! row per bot name, mutated only by the [`Supervisor`](crate::Supervisor).
//!
//! ## Status machine
//! ```text
//! init ──► waiting ──► scaning ──► login ⇄ logout
//!             │           │          │
//!             └───────────┴──────────┴──► stopped | failed
//! ```
//! The persisted labels are the ones returned by [`RunStatus::as_str`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog entry for a bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    /// Surrogate key.
    pub id: i64,
    /// Unique bot name; the key used by every run operation.
    pub name: String,
    /// Disabled bots cannot be started.
    pub enabled: bool,
    /// When the bot was added to the catalog.
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Row created, no session started yet.
    #[serde(rename = "init")]
    Init,
    /// Session started, awaiting the platform handshake.
    #[serde(rename = "waiting")]
    Waiting,
    /// A challenge (QR scan) is pending.
    #[serde(rename = "scaning")]
    Scanning,
    /// An identity is attached to the session.
    #[serde(rename = "login")]
    Login,
    /// The identity detached; the session handle was evicted.
    #[serde(rename = "logout")]
    Logout,
    /// The session shut down deliberately; the handle was evicted.
    #[serde(rename = "stopped")]
    Stopped,
    /// The session raised an error; the handle is retained.
    #[serde(rename = "failed")]
    Failed,
}

impl RunStatus {
    /// Persisted label of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Init => "init",
            RunStatus::Waiting => "waiting",
            RunStatus::Scanning => "scaning",
            RunStatus::Login => "login",
            RunStatus::Logout => "logout",
            RunStatus::Stopped => "stopped",
            RunStatus::Failed => "failed",
        }
    }

    /// True when reaching this status removes the session handle.
    pub fn evicts(&self) -> bool {
        matches!(self, RunStatus::Stopped | RunStatus::Logout)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted lifecycle record of a bot's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Surrogate key.
    pub id: i64,
    /// Owning bot.
    pub bot_id: i64,
    /// Optional link to a session instantiation record.
    pub instance_id: Option<i64>,
    /// Bot name (unique across runs).
    pub name: String,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Human-readable status detail.
    pub message: String,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

impl Run {
    /// Returns a copy of this run carrying a different status and message.
    ///
    /// Used for client-facing snapshots that are never written back.
    pub fn snapshot(&self, status: RunStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            ..self.clone()
        }
    }
}

/// Values for a run row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRun {
    /// Owning bot.
    pub bot_id: i64,
    /// Bot name.
    pub name: String,
    /// Initial status.
    pub status: RunStatus,
    /// Initial message.
    pub message: String,
}

impl NewRun {
    /// Message stored on a freshly created run.
    pub const INIT_MESSAGE: &'static str = "Waiting for scan code";

    /// Builds the initial `init` row for `bot`.
    pub fn init(bot: &Bot) -> Self {
        Self {
            bot_id: bot.id,
            name: bot.name.clone(),
            status: RunStatus::Init,
            message: Self::INIT_MESSAGE.to_string(),
        }
    }
}

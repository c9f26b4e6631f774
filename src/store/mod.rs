//! # Persistence ports.
//!
//! The supervisor never talks to a database directly. It consumes two
//! narrow async traits:
//!
//! - [`RunStore`]: one run row per bot name (find / insert / update status).
//! - [`BotStore`]: the read-only bot catalog.
//!
//! [`MemoryStore`] implements both in process; it backs the tests and is
//! usable for single-process deployments that do not need durability.

mod memory;

pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{Bot, NewRun, Run, RunStatus};

/// Storage for run records.
///
/// Rows are unique by `name`. Reads return `None` when absent; writes return
/// the written row.
#[async_trait]
pub trait RunStore: Send + Sync + 'static {
    /// Looks up the run row for a bot name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Run>, StoreError>;

    /// Inserts a new run row and returns it.
    async fn insert(&self, run: NewRun) -> Result<Run, StoreError>;

    /// Overwrites status and message of an existing row.
    async fn update_status(
        &self,
        id: i64,
        status: RunStatus,
        message: &str,
    ) -> Result<(), StoreError>;
}

/// Read access to the bot catalog.
#[async_trait]
pub trait BotStore: Send + Sync + 'static {
    /// Looks up a bot by name, enabled or not.
    async fn find_by_name(&self, name: &str) -> Result<Option<Bot>, StoreError>;

    /// Lists enabled bots ordered by id.
    async fn list_enabled(&self) -> Result<Vec<Bot>, StoreError>;
}

/// Shared handle to a run store.
pub type RunStoreRef = Arc<dyn RunStore>;

/// Shared handle to a bot store.
pub type BotStoreRef = Arc<dyn BotStore>;

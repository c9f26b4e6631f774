//! In-memory bot catalog and run table.
//!
//! Stores everything in process memory: lost on drop, but enough for tests
//! and single-process use. Every write is recorded in an append-only
//! history so callers can inspect the exact sequence of status transitions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{BotStore, RunStore};
use crate::error::StoreError;
use crate::types::{Bot, NewRun, Run, RunStatus};

#[derive(Default)]
struct Tables {
    bots: HashMap<String, Bot>,
    runs: HashMap<String, Run>,
    history: Vec<(String, RunStatus, String)>,
}

/// In-memory [`RunStore`] and [`BotStore`].
///
/// ### Test hooks
/// - [`set_latency`](Self::set_latency) delays every port call, which widens
///   race windows in concurrency tests;
/// - [`fail_writes`](Self::fail_writes) makes `update_status` fail.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_bot_id: AtomicI64,
    next_run_id: AtomicI64,
    fail_writes: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bot to the catalog and returns it.
    ///
    /// Re-adding an existing name only updates its `enabled` flag.
    pub fn add_bot(&self, name: impl Into<String>, enabled: bool) -> Result<Bot, StoreError> {
        let name = name.into();
        let mut tables = self.write()?;
        if let Some(bot) = tables.bots.get_mut(&name) {
            bot.enabled = enabled;
            return Ok(bot.clone());
        }
        let bot = Bot {
            id: self.next_bot_id.fetch_add(1, Ordering::Relaxed) + 1,
            name: name.clone(),
            enabled,
            created_at: Utc::now(),
        };
        tables.bots.insert(name, bot.clone());
        Ok(bot)
    }

    /// Enables or disables a bot. Returns `false` if the bot is unknown.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        Ok(match tables.bots.get_mut(name) {
            Some(bot) => {
                bot.enabled = enabled;
                true
            }
            None => false,
        })
    }

    /// Makes every subsequent `update_status` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delays every port call by `latency` (`None` = no delay).
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut slot) = self.latency.write() {
            *slot = latency;
        }
    }

    /// Returns every status write for `name`, oldest first.
    pub fn history(&self, name: &str) -> Vec<(RunStatus, String)> {
        self.tables
            .read()
            .map(|t| {
                t.history
                    .iter()
                    .filter(|(n, _, _)| n == name)
                    .map(|(_, s, m)| (*s, m.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of run rows.
    pub fn run_count(&self) -> usize {
        self.tables.read().map(|t| t.runs.len()).unwrap_or(0)
    }

    async fn delay(&self) {
        let latency = self.latency.read().ok().and_then(|l| *l);
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire store lock: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|e| StoreError::Unavailable(format!("Failed to acquire store lock: {e}")))
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Run>, StoreError> {
        self.delay().await;
        Ok(self.read()?.runs.get(name).cloned())
    }

    async fn insert(&self, run: NewRun) -> Result<Run, StoreError> {
        self.delay().await;
        let mut tables = self.write()?;
        if tables.runs.contains_key(&run.name) {
            return Err(StoreError::Conflict(format!(
                "run for '{}' already exists",
                run.name
            )));
        }
        let row = Run {
            id: self.next_run_id.fetch_add(1, Ordering::Relaxed) + 1,
            bot_id: run.bot_id,
            instance_id: None,
            name: run.name.clone(),
            status: run.status,
            message: run.message,
            created_at: Utc::now(),
        };
        tables
            .history
            .push((row.name.clone(), row.status, row.message.clone()));
        tables.runs.insert(run.name, row.clone());
        Ok(row)
    }

    async fn update_status(
        &self,
        id: i64,
        status: RunStatus,
        message: &str,
    ) -> Result<(), StoreError> {
        self.delay().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        let mut tables = self.write()?;
        let Some(row) = tables.runs.values_mut().find(|r| r.id == id) else {
            return Err(StoreError::NotFound(format!("run id={id}")));
        };
        row.status = status;
        row.message = message.to_string();
        let name = row.name.clone();
        tables.history.push((name, status, message.to_string()));
        Ok(())
    }
}

#[async_trait]
impl BotStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Bot>, StoreError> {
        self.delay().await;
        Ok(self.read()?.bots.get(name).cloned())
    }

    async fn list_enabled(&self) -> Result<Vec<Bot>, StoreError> {
        self.delay().await;
        let mut bots: Vec<Bot> = self
            .read()?
            .bots
            .values()
            .filter(|b| b.enabled)
            .cloned()
            .collect();
        bots.sort_by_key(|b| b.id);
        Ok(bots)
    }
}

//! # Fleet: bulk operations over the bot catalog.
//!
//! [`Fleet`] pairs the read-only [`BotStore`](crate::BotStore) with a
//! [`Supervisor`] and fans one action out to every enabled bot.
//!
//! ```text
//! dispatch(Start) ─► list_enabled() ─► [create(a), create(b), ...] (concurrent)
//!                                          └─► DispatchStats { success, failure, total }
//! ```
//!
//! One bot failing never aborts the others; failures are counted and logged.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::core::Supervisor;
use crate::error::RunError;
use crate::store::BotStoreRef;
use crate::types::Bot;

/// Action applied to every enabled bot by [`Fleet::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// `Supervisor::create` per bot.
    Start,
    /// `Supervisor::cancel` per bot.
    Stop,
}

impl Action {
    /// Returns the action name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Bots the action succeeded for.
    pub success: usize,
    /// Bots the action failed for.
    pub failure: usize,
    /// Enabled bots listed at dispatch time.
    pub total: usize,
}

/// Bot catalog plus supervisor.
pub struct Fleet {
    bots: BotStoreRef,
    supervisor: Arc<Supervisor>,
}

impl Fleet {
    /// Creates a fleet over `bots`, driving sessions through `supervisor`.
    pub fn new(bots: BotStoreRef, supervisor: Arc<Supervisor>) -> Self {
        Self { bots, supervisor }
    }

    /// The supervisor sessions are dispatched to.
    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    /// Lists enabled bots.
    pub async fn list(&self) -> Result<Vec<Bot>, RunError> {
        Ok(self.bots.list_enabled().await?)
    }

    /// Looks up an enabled bot.
    ///
    /// Absent or disabled: [`RunError::BotNotEnabled`] when `reject_on_not_found`,
    /// `Ok(None)` otherwise.
    pub async fn retrieve(
        &self,
        name: &str,
        reject_on_not_found: bool,
    ) -> Result<Option<Bot>, RunError> {
        match self.bots.find_by_name(name).await? {
            Some(bot) if bot.enabled => Ok(Some(bot)),
            _ if reject_on_not_found => Err(RunError::BotNotEnabled {
                name: name.to_string(),
            }),
            _ => Ok(None),
        }
    }

    /// Starts every enabled bot.
    pub async fn start(&self) -> Result<DispatchStats, RunError> {
        self.dispatch(Action::Start).await
    }

    /// Stops every enabled bot.
    pub async fn stop(&self) -> Result<DispatchStats, RunError> {
        self.dispatch(Action::Stop).await
    }

    /// Applies `action` to every enabled bot concurrently.
    ///
    /// Only a failure to list the catalog is returned as an error.
    pub async fn dispatch(&self, action: Action) -> Result<DispatchStats, RunError> {
        let bots = self.bots.list_enabled().await?;
        let total = bots.len();

        let outcomes = join_all(bots.iter().map(|bot| {
            let supervisor = &self.supervisor;
            let name = bot.name.as_str();
            async move {
                let res = match action {
                    Action::Start => supervisor.create(name).await,
                    Action::Stop => supervisor.cancel(name).await,
                };
                if let Err(e) = &res {
                    tracing::warn!(
                        bot = name,
                        action = action.as_str(),
                        error = %e,
                        label = e.as_label(),
                        "dispatch failed for bot"
                    );
                }
                res.is_ok()
            }
        }))
        .await;

        let success = outcomes.iter().filter(|ok| **ok).count();
        let stats = DispatchStats {
            success,
            failure: total - success,
            total,
        };
        tracing::info!(
            action = action.as_str(),
            success = stats.success,
            failure = stats.failure,
            total = stats.total,
            "dispatch finished"
        );
        Ok(stats)
    }
}

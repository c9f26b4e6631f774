use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{config::SupervisorConfig, supervisor::Supervisor};
use crate::{
    events::Broadcaster,
    session::ProviderRef,
    store::{BotStoreRef, RunStoreRef},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a Supervisor with optional features.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    provider: ProviderRef,
    runs: RunStoreRef,
    bots: BotStoreRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with default configuration.
    pub fn new(provider: ProviderRef, runs: RunStoreRef, bots: BotStoreRef) -> Self {
        Self {
            cfg: SupervisorConfig::default(),
            provider,
            runs,
            bots,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the runtime configuration.
    pub fn with_config(mut self, cfg: SupervisorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets in-process subscribers of the log broadcast.
    ///
    /// Each subscriber gets a bounded, optionally filtered slot on the
    /// broadcaster and a dedicated worker. Shutdown drains them.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds and returns the Supervisor instance.
    ///
    /// Must be called within a tokio runtime when subscribers are set (their
    /// workers are spawned here).
    pub fn build(self) -> Arc<Supervisor> {
        let broadcaster = Broadcaster::with_banner(self.cfg.banner.as_str());
        let runtime_token = CancellationToken::new();

        let subscribers = (!self.subscribers.is_empty())
            .then(|| SubscriberSet::attach(&broadcaster, self.subscribers));

        Arc::new(Supervisor::new_internal(
            self.cfg,
            self.provider,
            self.runs,
            self.bots,
            broadcaster,
            subscribers,
            runtime_token,
        ))
    }
}

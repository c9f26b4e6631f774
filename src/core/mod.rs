//! Runtime core: session ownership and lifecycle.
//!
//! The public API from this module is [`Supervisor`] (built through
//! [`SupervisorBuilder`] and tuned with [`SupervisorConfig`]).
//!
//! Internal modules:
//! - [`supervisor`]: create / cancel / retrieve / online, graceful shutdown;
//! - [`actor`]: applies one session's lifecycle events (status, eviction, log);
//! - [`registry`]: name-keyed handle table with per-name admission;
//! - [`builder`]: wiring of broadcaster, subscribers and runtime token;
//! - [`config`]: runtime settings.

mod actor;
mod builder;
mod config;
mod registry;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use supervisor::{Supervisor, STOPPED_MESSAGE};

//! # LogWriter: tracing echo of the log broadcast
//!
//! A subscriber that forwards every [`LogEntry`] to `tracing`, so session
//! lifecycle shows up in the process log next to the supervisor's own
//! diagnostics.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO puppetvisor: started bot="ade" event=start
//! INFO puppetvisor: Scan QR Code to login: ScanStatus(2) https://... bot="ade" event=scan
//! ERROR puppetvisor: socket closed bot="ade" event=error stack=Some("...")
//! ```

use async_trait::async_trait;

use crate::events::{Level, LogEntry};
use crate::subscribers::Subscribe;

/// Tracing-backed log subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &LogEntry) {
        match e.level {
            Level::Info => {
                tracing::info!(bot = %e.bot_name, event = %e.kind, "{}", e.message);
            }
            Level::Error => {
                tracing::error!(
                    bot = %e.bot_name,
                    event = %e.kind,
                    stack = ?e.stack,
                    "{}",
                    e.message
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

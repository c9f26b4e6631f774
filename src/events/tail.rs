//! # Live, filtered, cancellable tail of the log broadcast.
//!
//! A [`LogTail`] is an infinite [`Stream`] of rendered lines:
//! ```text
//! subscribe() ──► "Listen on logs stream." ──► line ──► line ──► ... ──► (cancel) None
//! ```
//!
//! ## Rules
//! - The banner is always the first item.
//! - Filtering happens at publish time; the tail only queues its own bot's entries.
//! - The queue is unbounded: a slow reader is never skipped ahead.
//! - Cancellation ends the stream without an error and drops the receiver,
//!   detaching the tail from the broadcaster. A finished tail stays finished.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use super::entry::LogEntry;

/// Stream of log lines handed out by [`Broadcaster::subscribe`](crate::Broadcaster::subscribe).
pub struct LogTail {
    inner: Option<BoxStream<'static, String>>,
}

impl LogTail {
    pub(crate) fn new(
        banner: Arc<str>,
        rx: mpsc::UnboundedReceiver<Arc<LogEntry>>,
        cancel: CancellationToken,
    ) -> Self {
        let lines = UnboundedReceiverStream::new(rx).map(|entry| entry.line());

        let stream = stream::once(future::ready(banner.to_string()))
            .chain(lines)
            .take_until(cancel.cancelled_owned());

        Self {
            inner: Some(stream.boxed()),
        }
    }

    /// True once the tail has ended; its receiver has been released.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Stream for LogTail {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.poll_next_unpin(cx) {
            Poll::Ready(None) => {
                self.inner = None;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

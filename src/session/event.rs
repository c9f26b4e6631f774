//! # Session lifecycle events and the sink sessions emit them into.
//!
//! A provider receives an [`EventSink`] when it instantiates a session and
//! calls it from whatever callback surface the platform client has. The sink
//! never blocks and never fails: events land in an unbounded FIFO queue
//! drained by the session's lifecycle actor.
//!
//! ## Example
//! ```rust
//! use puppetvisor::{EventSink, Identity, SessionEvent};
//!
//! let (sink, mut rx) = EventSink::channel();
//! sink.start();
//! sink.scan("https://login.example/qr/abc", 2);
//! sink.login(Identity::new("ade"));
//!
//! assert!(matches!(rx.try_recv(), Ok(SessionEvent::Start)));
//! assert!(matches!(rx.try_recv(), Ok(SessionEvent::Scan { status: 2, .. })));
//! assert!(matches!(rx.try_recv(), Ok(SessionEvent::Login(_))));
//! ```

use tokio::sync::mpsc;

use crate::error::SessionError;

/// Identity attached to a session (the logged-in account or a contact).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Display name.
    pub name: String,
}

impl Identity {
    /// Creates an identity with a display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A chat message observed by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Display name of the sender.
    pub talker: String,
    /// Provider's classification of the sender (personal, official, ...).
    pub talker_kind: String,
    /// Provider's message type (text, image, ...).
    pub kind: String,
    /// Topic of the group chat, `None` for direct messages.
    pub room: Option<String>,
}

impl IncomingMessage {
    /// Human-readable summary used as the log entry text.
    pub fn describe(&self) -> String {
        let origin = match &self.room {
            Some(topic) => format!("room({topic})"),
            None => "individual".to_string(),
        };
        format!(
            "receive {}({}) message({}) from {}",
            self.talker, self.talker_kind, self.kind, origin
        )
    }
}

/// Lifecycle event raised by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session started and awaits the platform handshake.
    Start,
    /// A challenge is pending: `qrcode` is the payload, `status` the provider's code.
    Scan { qrcode: String, status: i32 },
    /// The session shut down.
    Stop,
    /// The identity detached.
    Logout(Identity),
    /// An identity attached.
    Login(Identity),
    /// The session failed.
    Error(SessionError),
    /// A chat message arrived.
    Message(IncomingMessage),
}

/// Emission surface handed to a session at instantiation.
///
/// Cheap to clone; all clones feed the same queue.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    /// Creates a sink and the receiving end of its queue.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues an event. Dropped silently once nobody drives the session.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    /// True once the receiving actor has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    #[inline]
    pub fn start(&self) {
        self.emit(SessionEvent::Start);
    }

    #[inline]
    pub fn scan(&self, qrcode: impl Into<String>, status: i32) {
        self.emit(SessionEvent::Scan {
            qrcode: qrcode.into(),
            status,
        });
    }

    #[inline]
    pub fn stop(&self) {
        self.emit(SessionEvent::Stop);
    }

    #[inline]
    pub fn login(&self, identity: Identity) {
        self.emit(SessionEvent::Login(identity));
    }

    #[inline]
    pub fn logout(&self, identity: Identity) {
        self.emit(SessionEvent::Logout(identity));
    }

    #[inline]
    pub fn error(&self, error: SessionError) {
        self.emit(SessionEvent::Error(error));
    }

    #[inline]
    pub fn message(&self, message: IncomingMessage) {
        self.emit(SessionEvent::Message(message));
    }
}

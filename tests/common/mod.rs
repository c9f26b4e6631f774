#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use puppetvisor::{
    Bot, BotStore, EventSink, Identity, IncomingMessage, MemoryStore, ProviderError, Run,
    RunStatus, Session, SessionError, SessionProvider, SessionRef, StoreError, Supervisor,
    SupervisorConfig,
};

/// Installs a fmt subscriber once per test binary (`RUST_LOG` controls output).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How a scripted session reacts to `stop()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopMode {
    /// Emits `stop` and returns `Ok`.
    Emit,
    /// Returns `Ok` but never emits `stop`.
    Silent,
}

/// Session driven by the test through its [`EventSink`].
pub struct MockSession {
    sink: EventSink,
    logged_in: AtomicBool,
    stop_error: Mutex<Option<SessionError>>,
    start_error: Option<SessionError>,
    stop_mode: StopMode,
}

impl MockSession {
    pub fn scan(&self, qrcode: &str, status: i32) {
        self.sink.scan(qrcode, status);
    }

    pub fn login(&self, user: &str) {
        self.logged_in.store(true, Ordering::SeqCst);
        self.sink.login(Identity::new(user));
    }

    pub fn logout(&self, user: &str) {
        self.logged_in.store(false, Ordering::SeqCst);
        self.sink.logout(Identity::new(user));
    }

    pub fn fail(&self, message: &str) {
        self.sink
            .error(SessionError::new(message).with_stack("at puppet::poll"));
    }

    pub fn message(&self, talker: &str, room: Option<&str>) {
        self.sink.message(IncomingMessage {
            talker: talker.into(),
            talker_kind: "individual".into(),
            kind: "text".into(),
            room: room.map(str::to_string),
        });
    }

    pub fn set_stop_error(&self, message: &str) {
        *self.stop_error.lock().unwrap() = Some(SessionError::new(message));
    }
}

#[async_trait]
impl Session for MockSession {
    async fn start(&self) -> Result<(), SessionError> {
        if let Some(err) = &self.start_error {
            return Err(err.clone());
        }
        self.sink.start();
        Ok(())
    }

    async fn stop(&self) -> Result<(), SessionError> {
        if let Some(err) = self.stop_error.lock().unwrap().clone() {
            return Err(err);
        }
        if self.stop_mode == StopMode::Emit {
            self.sink.stop();
        }
        Ok(())
    }

    async fn ready(&self) {
        tokio::task::yield_now().await;
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }
}

/// Provider recording every instantiation and handing out [`MockSession`]s.
pub struct MockProvider {
    attempts: AtomicUsize,
    fail_instantiate: AtomicBool,
    fail_start: AtomicBool,
    stop_mode: Mutex<StopMode>,
    sessions: Mutex<HashMap<String, Arc<MockSession>>>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
            fail_instantiate: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            stop_mode: Mutex::new(StopMode::Emit),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    /// Number of `instantiate` calls, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn fail_instantiate(&self, fail: bool) {
        self.fail_instantiate.store(fail, Ordering::SeqCst);
    }

    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn stop_mode(&self, mode: StopMode) {
        *self.stop_mode.lock().unwrap() = mode;
    }

    /// Latest session instantiated for `name`.
    pub fn session(&self, name: &str) -> Arc<MockSession> {
        self.sessions
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("no session instantiated for {name}"))
    }
}

impl SessionProvider for MockProvider {
    fn instantiate(&self, run: &Run, events: EventSink) -> Result<SessionRef, ProviderError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_instantiate.load(Ordering::SeqCst) {
            return Err(ProviderError::new(&run.name, "puppet token rejected"));
        }
        let session = Arc::new(MockSession {
            sink: events,
            logged_in: AtomicBool::new(false),
            stop_error: Mutex::new(None),
            start_error: self
                .fail_start
                .load(Ordering::SeqCst)
                .then(|| SessionError::new("puppet refused to start")),
            stop_mode: *self.stop_mode.lock().unwrap(),
        });
        self.sessions
            .lock()
            .unwrap()
            .insert(run.name.clone(), Arc::clone(&session));
        Ok(session)
    }
}

/// Bot catalog whose listing is frozen at construction while lookups stay live.
pub struct StaleListing {
    listed: Vec<Bot>,
    live: Arc<MemoryStore>,
}

impl StaleListing {
    pub async fn snapshot(live: Arc<MemoryStore>) -> Arc<Self> {
        let listed = live.list_enabled().await.unwrap();
        Arc::new(Self { listed, live })
    }
}

#[async_trait]
impl BotStore for StaleListing {
    async fn find_by_name(&self, name: &str) -> Result<Option<Bot>, StoreError> {
        BotStore::find_by_name(self.live.as_ref(), name).await
    }

    async fn list_enabled(&self) -> Result<Vec<Bot>, StoreError> {
        Ok(self.listed.clone())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<MockProvider>,
    pub sup: Arc<Supervisor>,
}

/// Supervisor over a fresh store holding `bots` (all enabled).
pub fn harness(bots: &[&str]) -> Harness {
    harness_with(bots, SupervisorConfig::default())
}

pub fn harness_with(bots: &[&str], cfg: SupervisorConfig) -> Harness {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    for name in bots {
        store.add_bot(*name, true).unwrap();
    }
    let provider = MockProvider::new();
    let sup = Supervisor::builder(provider.clone(), store.clone(), store.clone())
        .with_config(cfg)
        .build();
    Harness {
        store,
        provider,
        sup,
    }
}

/// Polls the persisted run until it reaches `status`.
pub async fn wait_status(sup: &Supervisor, name: &str, status: RunStatus) -> Run {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(run) = sup.retrieve(name, false).await.unwrap() {
            if run.status == status {
                return run;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("{name}: expected {status}, still {}", run.status);
            }
        } else if tokio::time::Instant::now() > deadline {
            panic!("{name}: no run row");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Polls until `name` is (or is no longer) registered.
pub async fn wait_registered(sup: &Supervisor, name: &str, registered: bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while sup.is_registered(name).await != registered {
        if tokio::time::Instant::now() > deadline {
            panic!("{name}: registered != {registered}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

//! # Session handle table.
//!
//! The registry is the only mutable shared state of the supervisor. It maps a
//! bot name to the live session driven by this process.
//!
//! ## Architecture
//! ```text
//! Supervisor::create(name)
//!     └─► admit(name) ── per-name gate (held for the whole check-then-register)
//!            ├─► contains(name)?  yes ─► settle on the handle's write gate
//!            └─► no ─► instantiate ─► register(name, Handle)
//!
//! SessionActor (stop/logout) ──► evict(name, generation)
//! Supervisor::shutdown()      ──► drain()
//! ```
//!
//! ## Rules
//! - At most one handle per name.
//! - `evict` only removes the handle of the generation that asks for it, so
//!   a late event from an old session never evicts its successor.
//! - Admission gates are created lazily. The last [`Admission`] to leave a
//!   gate nobody else holds or waits on removes it from the table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::session::SessionRef;

/// Handle to a registered session.
pub(crate) struct Handle {
    /// The session itself.
    pub session: SessionRef,
    /// Distinguishes successive sessions registered under one name.
    pub generation: u64,
    /// Held by the lifecycle actor while a status write is in flight.
    pub writes: Arc<Mutex<()>>,
    /// Join handle of the lifecycle actor.
    pub actor: JoinHandle<()>,
    /// Cancels the lifecycle actor.
    pub cancel: CancellationToken,
}

type Gates = StdMutex<HashMap<String, Arc<Mutex<()>>>>;

fn lock_gates(gates: &Gates) -> StdMutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
    gates.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Exclusive admission rights on one name; released on drop.
pub(crate) struct Admission<'a> {
    gates: &'a Gates,
    name: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut gates = lock_gates(self.gates);
        // The table's own reference is the only one left: no holder, no waiter.
        if gates
            .get(&self.name)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            gates.remove(&self.name);
        }
    }
}

/// Name-keyed table of live sessions.
pub(crate) struct Registry {
    handles: RwLock<HashMap<String, Handle>>,
    gates: Gates,
    generations: AtomicU64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handles: RwLock::new(HashMap::new()),
            gates: StdMutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
        })
    }

    /// Waits for exclusive admission rights on `name`.
    ///
    /// The guard must be held across check-and-register so two callers racing
    /// on an absent name cannot both instantiate a session.
    pub async fn admit(&self, name: &str) -> Admission<'_> {
        let gate = Arc::clone(lock_gates(&self.gates).entry(name.to_string()).or_default());
        Admission {
            gates: &self.gates,
            name: name.to_string(),
            guard: Some(gate.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn gate_count(&self) -> usize {
        lock_gates(&self.gates).len()
    }

    /// Allocates a generation number for a new handle.
    pub fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Registers a handle. Returns the displaced handle, if any.
    pub async fn register(&self, name: &str, handle: Handle) -> Option<Handle> {
        self.handles.write().await.insert(name.to_string(), handle)
    }

    /// Removes the handle for `name` if it belongs to `generation`.
    pub async fn evict(&self, name: &str, generation: u64) -> bool {
        let mut handles = self.handles.write().await;
        match handles.get(name) {
            Some(h) if h.generation == generation => {
                handles.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Returns the session registered for `name`.
    pub async fn session(&self, name: &str) -> Option<SessionRef> {
        self.handles
            .read()
            .await
            .get(name)
            .map(|h| Arc::clone(&h.session))
    }

    /// Returns the write gate of the handle registered for `name`.
    pub async fn write_gate(&self, name: &str) -> Option<Arc<Mutex<()>>> {
        self.handles
            .read()
            .await
            .get(name)
            .map(|h| Arc::clone(&h.writes))
    }

    /// True if a handle is registered for `name`.
    pub async fn contains(&self, name: &str) -> bool {
        self.handles.read().await.contains_key(name)
    }

    /// Returns sorted list of registered names.
    pub async fn list(&self) -> Vec<String> {
        let handles = self.handles.read().await;
        let mut names: Vec<String> = handles.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Atomically removes every handle.
    pub async fn drain(&self) -> Vec<(String, Handle)> {
        let mut handles = self.handles.write().await;
        handles.drain().collect()
    }
}

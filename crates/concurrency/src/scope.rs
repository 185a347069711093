//! Scope manager: reference implementation of [`ScopeSource`]
//!
//! Issues scope tokens and tells listeners (caches) when a scope ends so
//! they can drop its partitions.
//!
//! ## Scope Lifecycle
//!
//! ```text
//! 1. begin()            - allocate a token, make it the active scope
//! 2. current_scope()    - active token (a scope is begun lazily if none is active)
//! 3. end() / end_scope  - clear the active scope, notify listeners
//! ```
//!
//! Beginning a scope while another is active ends the old one first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tracing::debug;

use docmap_core::{ParentKeyValue, ScopeSource, ScopeToken};

/// Receives scope-end notifications
pub trait ScopeListener: Send + Sync {
    /// Called once for every scope that ends
    fn scope_ended(&self, scope: ScopeToken);
}

static GLOBAL: Lazy<Arc<ScopeManager>> = Lazy::new(|| Arc::new(ScopeManager::new()));

/// Issues scope tokens and tracks the active scope
pub struct ScopeManager {
    /// Next scope id; ids start at 1
    next_scope: AtomicU64,
    active: Mutex<Option<ScopeToken>>,
    listeners: RwLock<Vec<Weak<dyn ScopeListener>>>,
    parent_keys: RwLock<FxHashMap<String, ParentKeyValue>>,
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScopeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeManager")
            .field("active", &*self.active.lock())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl ScopeManager {
    /// Create a manager with no active scope
    pub fn new() -> Self {
        ScopeManager {
            next_scope: AtomicU64::new(1),
            active: Mutex::new(None),
            listeners: RwLock::new(Vec::new()),
            parent_keys: RwLock::new(FxHashMap::default()),
        }
    }

    /// Process-wide manager
    pub fn global() -> Arc<ScopeManager> {
        Arc::clone(&GLOBAL)
    }

    /// Start a new scope, ending the active one if any
    pub fn begin(&self) -> ScopeToken {
        let token = self.allocate();
        let previous = self.active.lock().replace(token);
        if let Some(previous) = previous {
            self.notify(previous);
        }
        debug!(target: "docmap::scope", %token, "scope begun");
        token
    }

    fn allocate(&self) -> ScopeToken {
        ScopeToken::new(self.next_scope.fetch_add(1, Ordering::SeqCst))
    }

    /// End the active scope, returning its token
    pub fn end(&self) -> Option<ScopeToken> {
        let ended = self.active.lock().take();
        if let Some(token) = ended {
            self.notify(token);
        }
        ended
    }

    /// End `token` if it is still the active scope
    pub fn end_scope(&self, token: ScopeToken) -> bool {
        let ended = {
            let mut active = self.active.lock();
            if *active == Some(token) {
                active.take()
            } else {
                None
            }
        };
        match ended {
            Some(token) => {
                self.notify(token);
                true
            }
            None => false,
        }
    }

    /// Active scope, without beginning one
    pub fn active(&self) -> Option<ScopeToken> {
        *self.active.lock()
    }

    /// Begin a scope that ends when the returned guard is dropped
    pub fn enter(&self) -> ScopeGuard<'_> {
        ScopeGuard {
            manager: self,
            token: self.begin(),
        }
    }

    /// Register a listener; it is held weakly and dropped once gone
    pub fn subscribe<L: ScopeListener + 'static>(&self, listener: &Arc<L>) {
        let listener: Arc<dyn ScopeListener> = listener.clone();
        self.listeners.write().push(Arc::downgrade(&listener));
    }

    /// Parent key value handed to containers over `table`
    pub fn register_parent_key(&self, table: impl Into<String>, value: ParentKeyValue) {
        self.parent_keys.write().insert(table.into(), value);
    }

    fn notify(&self, token: ScopeToken) {
        let live: Vec<Arc<dyn ScopeListener>> = {
            let mut listeners = self.listeners.write();
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in &live {
            listener.scope_ended(token);
        }
        debug!(target: "docmap::scope", %token, listeners = live.len(), "scope ended");
    }
}

impl ScopeSource for ScopeManager {
    fn current_scope(&self) -> ScopeToken {
        let mut active = self.active.lock();
        if let Some(token) = *active {
            return token;
        }
        let token = self.allocate();
        *active = Some(token);
        debug!(target: "docmap::scope", %token, "scope begun implicitly");
        token
    }

    fn resolve_parent_key(&self, table: &str) -> Option<ParentKeyValue> {
        self.parent_keys.read().get(table).cloned()
    }
}

/// Ends its scope on drop, unless a newer scope replaced it
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    manager: &'a ScopeManager,
    token: ScopeToken,
}

impl ScopeGuard<'_> {
    /// Token of the guarded scope
    pub fn token(&self) -> ScopeToken {
        self.token
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.manager.end_scope(self.token);
    }
}

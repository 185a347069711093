//! Container liveness tracking
//!
//! Cache partitions are keyed by [`ContainerId`]. An id alone cannot tell a
//! live container from a dropped one whose raw id was reused, so every
//! container instance also owns a [`LivenessToken`] and the registry keeps a
//! weak reference to it. When a different token shows up for a known id, the
//! old instance is gone and anything cached for it is stale.

use docmap_core::ContainerId;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};

/// Bindings tolerated before the first sweep
pub const MIN_SWEEP_THRESHOLD: usize = 64;

/// Marker owned by exactly one container instance
#[derive(Debug)]
pub struct LivenessToken {
    id: ContainerId,
}

impl LivenessToken {
    /// Id this token was issued for
    pub fn id(&self) -> ContainerId {
        self.id
    }
}

/// Identity of one container instance: its id plus its liveness token
///
/// Deliberately not `Clone`; the token must die with the instance.
#[derive(Debug)]
pub struct ContainerIdentity {
    id: ContainerId,
    token: Arc<LivenessToken>,
}

impl ContainerIdentity {
    /// Issue a fresh, process-unique identity
    pub fn issue() -> Self {
        Self::with_id(ContainerId::next())
    }

    /// Build an identity for an explicit id
    ///
    /// The token is always fresh, so reusing an id from a dropped container
    /// is detected as a rebinding.
    pub fn with_id(id: ContainerId) -> Self {
        ContainerIdentity {
            id,
            token: Arc::new(LivenessToken { id }),
        }
    }

    /// The container id
    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub(crate) fn token(&self) -> &Arc<LivenessToken> {
        &self.token
    }
}

/// Outcome of binding an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// First time this id is seen
    Fresh,
    /// The id is already bound to this very instance
    Current,
    /// The id was bound to another instance, now replaced
    Rebound,
}

/// Registry of container ids to weak liveness tokens
///
/// Dropped instances leave dead bindings behind. Callers reclaim them with
/// [`take_dead`](Self::take_dead), or with [`take_dead_if_due`](Self::take_dead_if_due)
/// which only sweeps once the map has doubled since the last sweep.
#[derive(Debug)]
pub struct LivenessRegistry {
    inner: Mutex<Bindings>,
}

#[derive(Debug)]
struct Bindings {
    map: FxHashMap<ContainerId, Weak<LivenessToken>>,
    sweep_at: usize,
}

impl Default for LivenessRegistry {
    fn default() -> Self {
        LivenessRegistry {
            inner: Mutex::new(Bindings {
                map: FxHashMap::default(),
                sweep_at: MIN_SWEEP_THRESHOLD,
            }),
        }
    }
}

impl Bindings {
    fn take_dead(&mut self) -> Vec<ContainerId> {
        let mut dead = Vec::new();
        self.map.retain(|id, weak| {
            let alive = weak.strong_count() > 0;
            if !alive {
                dead.push(*id);
            }
            alive
        });
        self.sweep_at = (self.map.len() * 2).max(MIN_SWEEP_THRESHOLD);
        dead
    }
}

impl LivenessRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `identity`'s id to its token
    pub fn bind(&self, identity: &ContainerIdentity) -> Binding {
        let mut inner = self.inner.lock();
        let same_instance = inner
            .map
            .get(&identity.id())
            .map(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(identity.token())));
        let outcome = match same_instance {
            Some(true) => return Binding::Current,
            Some(false) => Binding::Rebound,
            None => Binding::Fresh,
        };
        inner.map.insert(identity.id(), Arc::downgrade(identity.token()));
        outcome
    }

    /// Remove bindings whose instance has been dropped, returning their ids
    pub fn take_dead(&self) -> Vec<ContainerId> {
        self.inner.lock().take_dead()
    }

    /// Like [`take_dead`](Self::take_dead), but only once the map has grown
    /// past its sweep threshold
    pub fn take_dead_if_due(&self) -> Vec<ContainerId> {
        let mut inner = self.inner.lock();
        if inner.map.len() < inner.sweep_at {
            return Vec::new();
        }
        inner.take_dead()
    }

    /// Number of bindings, live or not
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

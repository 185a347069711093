//! Transaction-scoped object cache
//!
//! One cache is shared by any number of containers. Its contents are split
//! into partitions keyed by `(ScopeToken, ContainerId)`:
//!
//! - a partition only lives as long as its scope; [`end_scope`] drops every
//!   partition of a finished scope
//! - a partition holds at most one object per mapping key
//! - a partition's `complete` flag means a full enumeration filled it, so a
//!   key it does not hold does not exist
//!
//! Every operation takes the caller's [`ContainerIdentity`] and first binds
//! it in the cache's [`LivenessRegistry`]. If the id was bound to another
//! instance, every partition under that id is purged before the operation
//! proceeds.
//!
//! [`end_scope`]: TransactionScopedCache::end_scope

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use docmap_core::{ContainerId, MappingKey, ObjectRef, ScopeToken};

use crate::liveness::{Binding, ContainerIdentity, LivenessRegistry};
use crate::scope::ScopeListener;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PartitionKey {
    scope: ScopeToken,
    container: ContainerId,
}

struct Partition<T> {
    entries: FxHashMap<MappingKey, ObjectRef<T>>,
    complete: bool,
}

impl<T> Default for Partition<T> {
    fn default() -> Self {
        Partition {
            entries: FxHashMap::default(),
            complete: false,
        }
    }
}

/// Observable state of one partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No partition, or an empty one that was never completed
    Unknown,
    /// Holds some entries, not known to be all of them
    Partial,
    /// Holds the definitive key set
    Complete,
}

/// Object cache partitioned by scope and container instance
pub struct TransactionScopedCache<T> {
    partitions: DashMap<PartitionKey, Partition<T>>,
    registry: LivenessRegistry,
}

impl<T> Default for TransactionScopedCache<T> {
    fn default() -> Self {
        TransactionScopedCache {
            partitions: DashMap::new(),
            registry: LivenessRegistry::new(),
        }
    }
}

impl<T> std::fmt::Debug for TransactionScopedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScopedCache")
            .field("partitions", &self.partitions.len())
            .field("registry", &self.registry)
            .finish()
    }
}

impl<T> TransactionScopedCache<T> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the caller and purge partitions left by a previous holder of its id
    fn ensure_bound(&self, identity: &ContainerIdentity) {
        if self.registry.bind(identity) == Binding::Rebound {
            let purged = self.purge_container(identity.id());
            debug!(
                target: "docmap::cache",
                container = %identity.id(),
                purged,
                "container id rebound, purged stale partitions"
            );
        }
        let dead = self.registry.take_dead_if_due();
        if !dead.is_empty() {
            self.purge_dead(dead);
        }
    }

    fn purge_dead(&self, dead: Vec<ContainerId>) -> usize {
        let bindings = dead.len();
        let purged = dead.into_iter().map(|id| self.purge_container(id)).sum();
        debug!(target: "docmap::cache", bindings, purged, "swept dead containers");
        purged
    }

    fn purge_container(&self, container: ContainerId) -> usize {
        let before = self.partitions.len();
        self.partitions.retain(|key, _| key.container != container);
        before - self.partitions.len()
    }

    fn key(identity: &ContainerIdentity, scope: ScopeToken) -> PartitionKey {
        PartitionKey {
            scope,
            container: identity.id(),
        }
    }

    /// Cached object for `key`
    pub fn get(
        &self,
        identity: &ContainerIdentity,
        scope: ScopeToken,
        key: &MappingKey,
    ) -> Option<ObjectRef<T>> {
        self.ensure_bound(identity);
        let hit = self
            .partitions
            .get(&Self::key(identity, scope))
            .and_then(|p| p.entries.get(key).cloned());
        trace!(target: "docmap::cache", %scope, key = %key, hit = hit.is_some(), "lookup");
        hit
    }

    /// Cache `object` under `key`, replacing any previous entry
    pub fn put(
        &self,
        identity: &ContainerIdentity,
        scope: ScopeToken,
        key: MappingKey,
        object: ObjectRef<T>,
    ) {
        self.ensure_bound(identity);
        self.partitions
            .entry(Self::key(identity, scope))
            .or_default()
            .entries
            .insert(key, object);
    }

    /// Drop the entry for `key`, returning it
    pub fn remove(
        &self,
        identity: &ContainerIdentity,
        scope: ScopeToken,
        key: &MappingKey,
    ) -> Option<ObjectRef<T>> {
        self.ensure_bound(identity);
        self.partitions
            .get_mut(&Self::key(identity, scope))
            .and_then(|mut p| p.entries.remove(key))
    }

    /// Whether the partition holds the definitive key set
    pub fn is_complete(&self, identity: &ContainerIdentity, scope: ScopeToken) -> bool {
        self.ensure_bound(identity);
        self.partitions
            .get(&Self::key(identity, scope))
            .map_or(false, |p| p.complete)
    }

    /// Record that the partition now holds the definitive key set
    pub fn mark_complete(&self, identity: &ContainerIdentity, scope: ScopeToken) {
        self.ensure_bound(identity);
        let mut partition = self.partitions.entry(Self::key(identity, scope)).or_default();
        partition.complete = true;
        debug!(
            target: "docmap::cache",
            %scope,
            container = %identity.id(),
            entries = partition.entries.len(),
            "partition complete"
        );
    }

    /// Drop the partition entirely
    pub fn invalidate(&self, identity: &ContainerIdentity, scope: ScopeToken) {
        self.ensure_bound(identity);
        if self.partitions.remove(&Self::key(identity, scope)).is_some() {
            debug!(target: "docmap::cache", %scope, container = %identity.id(), "partition invalidated");
        }
    }

    /// Empty the partition and mark it complete: the container is known to be empty
    pub fn clear(&self, identity: &ContainerIdentity, scope: ScopeToken) {
        self.ensure_bound(identity);
        let mut partition = self.partitions.entry(Self::key(identity, scope)).or_default();
        partition.entries.clear();
        partition.complete = true;
    }

    /// Cached keys, sorted
    pub fn keys(&self, identity: &ContainerIdentity, scope: ScopeToken) -> Vec<MappingKey> {
        self.ensure_bound(identity);
        let mut keys: Vec<MappingKey> = self
            .partitions
            .get(&Self::key(identity, scope))
            .map(|p| p.entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Cached entries, sorted by key
    pub fn entries(
        &self,
        identity: &ContainerIdentity,
        scope: ScopeToken,
    ) -> Vec<(MappingKey, ObjectRef<T>)> {
        self.ensure_bound(identity);
        let mut entries: Vec<_> = self
            .partitions
            .get(&Self::key(identity, scope))
            .map(|p| {
                p.entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Completion state of the partition
    pub fn cache_state(&self, identity: &ContainerIdentity, scope: ScopeToken) -> CacheState {
        self.ensure_bound(identity);
        match self.partitions.get(&Self::key(identity, scope)) {
            Some(p) if p.complete => CacheState::Complete,
            Some(p) if !p.entries.is_empty() => CacheState::Partial,
            _ => CacheState::Unknown,
        }
    }

    /// Drop every partition of `scope`, returning how many were dropped
    pub fn end_scope(&self, scope: ScopeToken) -> usize {
        let before = self.partitions.len();
        self.partitions.retain(|key, _| key.scope != scope);
        let dropped = before - self.partitions.len();
        debug!(target: "docmap::cache", %scope, dropped, "scope ended");
        dropped
    }

    /// Drop partitions of containers that no longer exist
    pub fn sweep(&self) -> usize {
        self.purge_dead(self.registry.take_dead())
    }

    /// Number of live partitions
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Number of container ids tracked by the liveness registry
    pub fn bound_containers(&self) -> usize {
        self.registry.len()
    }
}

impl<T: Send + Sync> ScopeListener for TransactionScopedCache<T> {
    fn scope_ended(&self, scope: ScopeToken) {
        self.end_scope(scope);
        self.sweep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmap_core::Contained;

    const S1: ScopeToken = ScopeToken::new(1);
    const S2: ScopeToken = ScopeToken::new(2);

    fn key(k: &str) -> MappingKey {
        MappingKey::from(k)
    }

    #[test]
    fn test_put_get_remove() {
        let cache = TransactionScopedCache::new();
        let me = ContainerIdentity::issue();
        let obj = Contained::shared(1);
        cache.put(&me, S1, key("a"), obj.clone());
        let hit = cache.get(&me, S1, &key("a")).unwrap();
        assert!(Contained::same(&hit, &obj));
        assert!(cache.remove(&me, S1, &key("a")).is_some());
        assert!(cache.get(&me, S1, &key("a")).is_none());
    }

    #[test]
    fn test_partitions_are_isolated_by_scope_and_container() {
        let cache = TransactionScopedCache::new();
        let a = ContainerIdentity::issue();
        let b = ContainerIdentity::issue();
        cache.put(&a, S1, key("k"), Contained::shared(1));
        assert!(cache.get(&a, S2, &key("k")).is_none());
        assert!(cache.get(&b, S1, &key("k")).is_none());
    }

    #[test]
    fn test_state_machine() {
        let cache = TransactionScopedCache::new();
        let me = ContainerIdentity::issue();
        assert_eq!(cache.cache_state(&me, S1), CacheState::Unknown);
        cache.put(&me, S1, key("a"), Contained::shared(1));
        assert_eq!(cache.cache_state(&me, S1), CacheState::Partial);
        cache.mark_complete(&me, S1);
        assert_eq!(cache.cache_state(&me, S1), CacheState::Complete);
        assert!(cache.is_complete(&me, S1));
        cache.invalidate(&me, S1);
        assert_eq!(cache.cache_state(&me, S1), CacheState::Unknown);
    }

    #[test]
    fn test_clear_leaves_empty_complete_partition() {
        let cache = TransactionScopedCache::new();
        let me = ContainerIdentity::issue();
        cache.put(&me, S1, key("a"), Contained::shared(1));
        cache.clear(&me, S1);
        assert!(cache.is_complete(&me, S1));
        assert!(cache.keys(&me, S1).is_empty());
    }

    #[test]
    fn test_end_scope_drops_only_that_scope() {
        let cache = TransactionScopedCache::new();
        let a = ContainerIdentity::issue();
        let b = ContainerIdentity::issue();
        cache.put(&a, S1, key("x"), Contained::shared(1));
        cache.put(&b, S1, key("x"), Contained::shared(2));
        cache.put(&a, S2, key("x"), Contained::shared(3));
        assert_eq!(cache.end_scope(S1), 2);
        assert_eq!(cache.partition_count(), 1);
        assert!(cache.get(&a, S2, &key("x")).is_some());
    }

    #[test]
    fn test_reused_container_id_does_not_inherit_entries() {
        let cache = TransactionScopedCache::new();
        let id = ContainerId::next();
        let first = ContainerIdentity::with_id(id);
        cache.put(&first, S1, key("stale"), Contained::shared(1));
        cache.mark_complete(&first, S1);
        drop(first);

        let second = ContainerIdentity::with_id(id);
        assert!(!cache.is_complete(&second, S1));
        assert!(cache.get(&second, S1, &key("stale")).is_none());
    }

    #[test]
    fn test_keys_and_entries_are_sorted() {
        let cache = TransactionScopedCache::new();
        let me = ContainerIdentity::issue();
        for k in ["c", "a", "b"] {
            cache.put(&me, S1, key(k), Contained::shared(k.to_string()));
        }
        assert_eq!(cache.keys(&me, S1), vec![key("a"), key("b"), key("c")]);
        let values: Vec<String> = cache
            .entries(&me, S1)
            .iter()
            .map(|(_, v)| v.read().clone())
            .collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sweep_drops_dead_containers() {
        let cache = TransactionScopedCache::new();
        let kept = ContainerIdentity::issue();
        let gone = ContainerIdentity::issue();
        cache.put(&kept, S1, key("a"), Contained::shared(1));
        cache.put(&gone, S1, key("a"), Contained::shared(2));
        cache.put(&gone, S2, key("a"), Contained::shared(3));
        drop(gone);
        assert_eq!(cache.sweep(), 2);
        assert_eq!(cache.partition_count(), 1);
    }

    #[test]
    fn test_short_lived_containers_do_not_accumulate() {
        let cache = TransactionScopedCache::new();
        let kept = ContainerIdentity::issue();
        cache.put(&kept, S1, key("a"), Contained::shared(0));
        for i in 0..1000 {
            let temp = ContainerIdentity::issue();
            cache.put(&temp, S1, key("a"), Contained::shared(i));
        }
        assert!(cache.bound_containers() < 2 * crate::liveness::MIN_SWEEP_THRESHOLD);
        assert!(cache.partition_count() < 2 * crate::liveness::MIN_SWEEP_THRESHOLD);
        assert!(cache.get(&kept, S1, &key("a")).is_some());
    }

    #[test]
    fn test_scope_end_sweeps_dead_containers() {
        let cache = TransactionScopedCache::new();
        let gone = ContainerIdentity::issue();
        cache.put(&gone, S1, key("a"), Contained::shared(1));
        cache.put(&gone, S2, key("a"), Contained::shared(2));
        drop(gone);
        cache.scope_ended(S1);
        assert_eq!(cache.partition_count(), 0);
        assert_eq!(cache.bound_containers(), 0);
    }
}

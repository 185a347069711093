//! Shared test utilities for the workspace scenario suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::{Arc, Once};

pub use docmap::{
    CacheState, Contained, ContainerConfig, ContainerId, ContainerIdentity, DocumentContainer,
    Error, JsonCodec, JsonValue, MappingKey, MemoryStore, ObjectRef, PolicyKind, Predicate,
    ScopeManager, Store, StoreError, TransactionScopedCache,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `docmap::*` spans to the test writer, once per binary.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doc {
    pub x: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub fn doc(x: i64) -> ObjectRef<Doc> {
    Contained::shared(Doc { x, tags: Vec::new() })
}

// ============================================================================
// TestEnv - store, scopes and cache wired together
// ============================================================================

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub scopes: Arc<ScopeManager>,
    pub cache: Arc<TransactionScopedCache<Doc>>,
}

impl TestEnv {
    pub fn new() -> Self {
        init_tracing();
        let cache = Arc::new(TransactionScopedCache::new());
        let scopes = Arc::new(ScopeManager::new());
        scopes.subscribe(&cache);
        TestEnv {
            store: Arc::new(MemoryStore::new()),
            scopes,
            cache,
        }
    }

    pub fn open(&self, config: ContainerConfig) -> docmap::Result<DocumentContainer<Doc>> {
        self.open_as(config, ContainerIdentity::issue())
    }

    pub fn open_as(
        &self,
        config: ContainerConfig,
        identity: ContainerIdentity,
    ) -> docmap::Result<DocumentContainer<Doc>> {
        DocumentContainer::with_identity(
            config,
            self.store.clone(),
            Arc::new(JsonCodec::<Doc>::new()),
            self.scopes.clone(),
            self.cache.clone(),
            identity,
        )
    }

    /// Container over table `t` keyed by `key`, scoped to parent `C1`
    pub fn scenario_container(&self) -> DocumentContainer<Doc> {
        self.open(
            ContainerConfig::new("t")
                .with_mapping_key_field("key")
                .with_parent_key_field("parent")
                .with_parent_value("C1"),
        )
        .unwrap()
    }

    pub fn reads(&self) -> u64 {
        self.store.stats().reads()
    }

    pub fn round_trips(&self) -> u64 {
        self.store.stats().snapshot().total()
    }
}

//! docmap - transaction-scoped mapping containers over a JSON document store
//!
//! A [`DocumentContainer`] exposes one logical container (a table, optionally
//! narrowed to the rows of one parent) as a mapping from string keys to live
//! objects. Objects are cached per transaction scope, so repeated lookups
//! inside a scope return the same instance without another store round trip.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use docmap::{
//!     Contained, ContainerConfig, DocumentContainer, JsonCodec, MemoryStore, ScopeManager,
//!     TransactionScopedCache,
//! };
//!
//! let cache = Arc::new(TransactionScopedCache::new());
//! let scopes = Arc::new(ScopeManager::new());
//! scopes.subscribe(&cache);
//!
//! let people: DocumentContainer<Person> = DocumentContainer::new(
//!     ContainerConfig::new("people").with_mapping_key_field("key"),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(JsonCodec::new()),
//!     scopes.clone(),
//!     cache,
//! )?;
//!
//! people.set("roy", &Contained::shared(Person::new("Roy")))?;
//! let roy = people.get("roy")?;
//! ```
//!
//! # Architecture
//!
//! - `docmap-core`: keys, rows, queries, errors and the `Store`/`Codec`/`ScopeSource` seams
//! - `docmap-storage`: in-memory reference store and the serde JSON codec
//! - `docmap-concurrency`: the transaction-scoped cache and scope manager
//! - `docmap-container`: the container itself

pub use docmap_concurrency::{
    CacheState, ContainerIdentity, ScopeGuard, ScopeListener, ScopeManager,
    TransactionScopedCache,
};
pub use docmap_container::{
    ContainerConfig, DocumentContainer, FindCursor, FindOptions, IdentityPolicy, PolicyKind,
    QueryTranslator, RawRows, SortKey,
};
pub use docmap_core::{
    Codec, Contained, ContainerId, DocId, Error, Identity, JsonPath, JsonValue, MappingKey,
    NewRow, ObjectRef, Operator, ParentKeyValue, Predicate, Result, Row, ScopeSource, ScopeToken,
    Store, StoreError, StoreResult,
};
pub use docmap_storage::{JsonCodec, MemoryStore, QueryStats, StatsSnapshot};

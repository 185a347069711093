//! Concurrency layer for docmap
//!
//! This crate implements the transaction-scoped caching machinery:
//! - TransactionScopedCache: object cache partitioned by (scope, container)
//! - LivenessRegistry: weak registry detecting container id reuse
//! - ScopeManager: issues scope tokens and notifies caches when scopes end

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod liveness;
pub mod scope;

pub use cache::{CacheState, TransactionScopedCache};
pub use liveness::{
    Binding, ContainerIdentity, LivenessRegistry, LivenessToken, MIN_SWEEP_THRESHOLD,
};
pub use scope::{ScopeGuard, ScopeListener, ScopeManager};

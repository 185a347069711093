//! Core traits for store, codec and scope abstraction
//!
//! These traits are the seams between the container and its collaborators,
//! so backends and object mappings can be swapped without touching the
//! container logic.

use crate::document::{NewRow, Row};
use crate::error::{Result, StoreResult};
use crate::json::JsonValue;
use crate::query::{Projection, QueryFragment, SelectOptions};
use crate::types::{DocId, ParentKeyValue, ScopeToken};

/// Lazily produced rows of a select
///
/// Each item may fail independently; a cursor that yielded an error is not
/// required to produce further rows.
pub type RowCursor<'a> = Box<dyn Iterator<Item = StoreResult<Row>> + Send + 'a>;

/// Document store abstraction
///
/// A store holds tables of rows (`id`, native columns, JSON blob) and
/// executes [`QueryFragment`]s against them.
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Store: Send + Sync {
    /// Select rows of `table` matching `filter`
    ///
    /// Rows are returned in `options.order_by` order, or insertion order
    /// when no ordering is given. Unknown tables yield no rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the select cannot be started; per-row failures
    /// surface through the cursor.
    fn select(
        &self,
        table: &str,
        projection: &Projection,
        filter: &QueryFragment,
        options: &SelectOptions,
    ) -> StoreResult<RowCursor<'_>>;

    /// Count rows of `table` matching `filter`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn count(&self, table: &str, filter: &QueryFragment) -> StoreResult<u64>;

    /// Insert a row, returning its new identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn insert(&self, table: &str, row: NewRow) -> StoreResult<DocId>;

    /// Replace the native columns and blob of the row with identifier `id`
    ///
    /// Returns the number of rows updated (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn update(&self, table: &str, id: &DocId, row: NewRow) -> StoreResult<u64>;

    /// Delete rows of `table` matching `filter`, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn delete(&self, table: &str, filter: &QueryFragment) -> StoreResult<u64>;
}

/// Conversion between objects and stored documents
pub trait Codec<T>: Send + Sync {
    /// Encode an object into a JSON document (must be an object)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`](crate::Error::Encode) if the object cannot
    /// be represented as a JSON object.
    fn encode(&self, value: &T) -> Result<JsonValue>;

    /// Decode a stored document into an object
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) naming `id` on failure.
    fn decode(&self, id: &DocId, data: &JsonValue) -> Result<T>;
}

/// Source of the active transaction scope
///
/// Caches are partitioned by the token returned here; a new token means a
/// fresh unit of work whose reads must not see another scope's cached
/// objects.
pub trait ScopeSource: Send + Sync {
    /// Token of the active scope
    fn current_scope(&self) -> ScopeToken;

    /// Resolve the parent key value for a container over `table` from the
    /// surrounding persistence context
    ///
    /// Used when a container is configured with a parent key field but no
    /// explicit value.
    fn resolve_parent_key(&self, _table: &str) -> Option<ParentKeyValue> {
        None
    }
}

//! Core types and traits for docmap
//!
//! This crate defines the foundational types used throughout the system:
//! - MappingKey, DocId, ParentKeyValue: identifiers flowing between layers
//! - ScopeToken, ContainerId: cache partitioning handles
//! - ObjectRef / Contained: shared object handles with attached identity
//! - Row / NewRow: the row shape exchanged with stores
//! - Predicate / QueryFragment: caller-level and backend-level filters
//! - JSON types: JsonValue, JsonPath and path accessors
//! - Error: Error type hierarchy
//! - Traits: Store, Codec, ScopeSource

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod json;
pub mod object;
pub mod query;
pub mod traits;
pub mod types;

pub use document::{NewRow, Row};
pub use error::{Error, Result, StoreError, StoreResult};
pub use json::{
    compare_values, get_at_path, values_equal, JsonPath, JsonValue, PathParseError, PathSegment,
    MAX_PATH_LENGTH,
};
pub use object::{Contained, Identity, ObjectRef};
pub use query::{
    FieldRef, Operator, OrderBy, Predicate, Projection, QueryFragment, SelectOptions, Selection,
};
pub use traits::{Codec, RowCursor, ScopeSource, Store};
pub use types::{ContainerId, DocId, MappingKey, ParentKeyValue, ScopeToken, ID_COLUMN};

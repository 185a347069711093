//! Identity types for docmap
//!
//! This module defines the identifiers that flow between layers:
//! - MappingKey: key under which an object is exposed by a container
//! - DocId: store-assigned row identifier (the native `id` column)
//! - ParentKeyValue: marker scoping a document to one logical container
//! - ScopeToken: opaque handle for the active transaction scope
//! - ContainerId: identity issued once per container instance

use crate::json::JsonValue;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Name of the native identifier column present in every table
pub const ID_COLUMN: &str = "id";

/// Key under which an object is exposed through a container's mapping interface
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingKey(String);

impl MappingKey {
    /// Create a key from any string-like value
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate a fresh container-local key (UUID v4, simple format)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Read a key out of a stored JSON value
    ///
    /// Only strings are accepted: keys are always matched as strings.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        value.as_str().map(|s| Self(s.to_string()))
    }

    /// The key as a JSON string value
    pub fn to_json(&self) -> JsonValue {
        JsonValue::String(self.0.clone())
    }

    /// Borrow the key as `&str`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MappingKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MappingKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<DocId> for MappingKey {
    fn from(id: DocId) -> Self {
        Self(id.0)
    }
}

impl From<&DocId> for MappingKey {
    fn from(id: &DocId) -> Self {
        Self(id.0.clone())
    }
}

impl Borrow<str> for MappingKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MappingKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Store-assigned document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Borrow the identifier as `&str`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier as a JSON string value
    pub fn to_json(&self) -> JsonValue {
        JsonValue::String(self.0.clone())
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Value identifying which logical container a document belongs to
///
/// Several containers may share one table; each writes its parent key value
/// onto the documents it owns and scopes every read by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentKeyValue(JsonValue);

impl ParentKeyValue {
    /// Wrap a JSON value
    pub fn new(value: impl Into<JsonValue>) -> Self {
        Self(value.into())
    }

    /// Borrow the JSON value
    pub fn as_json(&self) -> &JsonValue {
        &self.0
    }

    /// Consume into the JSON value
    pub fn into_json(self) -> JsonValue {
        self.0
    }
}

impl fmt::Display for ParentKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParentKeyValue {
    fn from(s: &str) -> Self {
        Self(JsonValue::String(s.to_string()))
    }
}

/// Opaque handle identifying the active transaction / unit of work
///
/// Used purely to partition caches; two tokens are the same scope iff equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeToken(u64);

impl ScopeToken {
    /// Create a token from a raw transaction id
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw transaction id
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity handle issued once per container instance
///
/// Distinguishes container *instances*, not logical containers: two
/// instances over the same table and parent key get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(u64);

impl ContainerId {
    /// Issue the next process-unique id
    pub fn next() -> Self {
        Self(NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild an id from its raw value
    ///
    /// Reusing a raw value that belonged to another instance is allowed: the
    /// cache detects the rebinding and purges whatever the old instance left.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

//! Shared handles to contained objects
//!
//! Containers hand out [`ObjectRef`]s. The same `ObjectRef` is returned for
//! a key for as long as the cache partition holding it lives, so callers
//! can compare handles with [`Contained::same`] to check object identity.
//!
//! Besides the value itself a contained object carries its [`Identity`]:
//! the store row it was loaded from or written to, the mapping key it is
//! exposed under, and the parent key of the owning container.

use crate::types::{DocId, MappingKey, ParentKeyValue};
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared handle to a contained object
pub type ObjectRef<T> = Arc<Contained<T>>;

/// Persistence identity attached to an object by a container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    /// Store row identifier, once the object has been persisted
    pub doc_id: Option<DocId>,
    /// Table the row lives in
    pub table: Option<String>,
    /// Key the object is exposed under
    pub name: Option<MappingKey>,
    /// Parent key of the owning container
    pub parent: Option<ParentKeyValue>,
}

impl Identity {
    /// Identity of a persisted row, not yet bound to a key
    pub fn persisted(table: impl Into<String>, doc_id: DocId) -> Self {
        Identity {
            doc_id: Some(doc_id),
            table: Some(table.into()),
            ..Default::default()
        }
    }

    /// Whether the identity refers to a row of `table`
    pub fn is_in_table(&self, table: &str) -> bool {
        self.doc_id.is_some() && self.table.as_deref() == Some(table)
    }
}

/// An object plus the identity a container attached to it
#[derive(Debug)]
pub struct Contained<T> {
    value: RwLock<T>,
    identity: Mutex<Identity>,
}

impl<T> Contained<T> {
    /// Wrap a fresh, never persisted object
    pub fn shared(value: T) -> ObjectRef<T> {
        Arc::new(Contained {
            value: RwLock::new(value),
            identity: Mutex::new(Identity::default()),
        })
    }

    /// Wrap an object loaded from a store row
    pub fn loaded(value: T, identity: Identity) -> ObjectRef<T> {
        Arc::new(Contained {
            value: RwLock::new(value),
            identity: Mutex::new(identity),
        })
    }

    /// Read access to the value
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.value.read()
    }

    /// Write access to the value; persist the change with the container's `update`
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.value.write()
    }

    /// Snapshot of the identity
    pub fn identity(&self) -> Identity {
        self.identity.lock().clone()
    }

    /// Store row identifier, if persisted
    pub fn doc_id(&self) -> Option<DocId> {
        self.identity.lock().doc_id.clone()
    }

    /// Key the object is exposed under, if any
    pub fn name(&self) -> Option<MappingKey> {
        self.identity.lock().name.clone()
    }

    /// Parent key of the owning container, if any
    pub fn parent(&self) -> Option<ParentKeyValue> {
        self.identity.lock().parent.clone()
    }

    /// Whether a container currently exposes this object under a key
    pub fn is_contained(&self) -> bool {
        self.identity.lock().name.is_some()
    }

    /// Replace the identity
    pub fn attach(&self, identity: Identity) {
        *self.identity.lock() = identity;
    }

    /// Whether two handles refer to the same object
    pub fn same(a: &ObjectRef<T>, b: &ObjectRef<T>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

//! DocumentContainer: a mapping interface over one logical container's rows
//!
//! Reads go to the transaction-scoped cache first and to the store on a
//! miss. Writes go to the store first; the cache and the object's identity
//! are only touched once the store call succeeded, so a failed operation
//! leaves both as they were.
//!
//! # Cache completeness
//!
//! ```text
//! Unknown --get/set/find--> Partial --items/values/clear--> Complete
//!    ^                                                        |
//!    +------------- scope end / invalidate / id reuse --------+
//! ```
//!
//! A complete partition answers `get`, `contains`, `keys` and `items`
//! without a query. `keys()` never completes a partition because it loads
//! no objects. `count()` always asks the store.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use docmap_concurrency::{CacheState, ContainerIdentity, TransactionScopedCache};
use docmap_core::{
    Codec, Contained, ContainerId, DocId, Error, FieldRef, Identity, JsonValue, MappingKey, NewRow,
    ObjectRef, ParentKeyValue, Predicate, Projection, QueryFragment, Result, Row, ScopeSource,
    ScopeToken, SelectOptions, Store, StoreResult,
};

use crate::config::ContainerConfig;
use crate::cursor::FindCursor;
use crate::identity::{IdentityPolicy, KeyAssignment};
use crate::translator::{QueryTranslator, SortKey};

/// Undecoded rows returned by [`DocumentContainer::raw_find`]
pub type RawRows<'a> = Box<dyn Iterator<Item = Result<Row>> + Send + 'a>;

/// Ordering and paging for finds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Sort keys, most significant first
    pub order_by: Vec<SortKey>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Results to skip
    pub offset: usize,
}

impl FindOptions {
    /// No ordering, no paging
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sort key
    pub fn order_by(mut self, key: SortKey) -> Self {
        self.order_by.push(key);
        self
    }

    /// Limit the number of results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip results
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// What currently occupies a key
enum Slot<T> {
    /// Nothing
    Vacant,
    /// The object being set, already cached under the key
    Unchanged,
    /// The object being set owns the stored row
    Own(DocId),
    /// Another object's row
    Taken {
        doc_id: DocId,
        previous: Option<ObjectRef<T>>,
    },
}

/// Persistent mapping from keys to objects of type `T`
pub struct DocumentContainer<T> {
    config: ContainerConfig,
    policy: IdentityPolicy,
    translator: QueryTranslator,
    store: Arc<dyn Store>,
    codec: Arc<dyn Codec<T>>,
    scopes: Arc<dyn ScopeSource>,
    cache: Arc<TransactionScopedCache<T>>,
    identity: ContainerIdentity,
}

impl<T> std::fmt::Debug for DocumentContainer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentContainer")
            .field("id", &self.identity.id())
            .field("table", &self.config.table)
            .field("policy", &self.policy.kind())
            .finish()
    }
}

impl<T: Send + Sync + 'static> DocumentContainer<T> {
    /// Open a container with a freshly issued identity
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `config` is invalid. Nothing is
    /// read from or written to the store.
    pub fn new(
        config: ContainerConfig,
        store: Arc<dyn Store>,
        codec: Arc<dyn Codec<T>>,
        scopes: Arc<dyn ScopeSource>,
        cache: Arc<TransactionScopedCache<T>>,
    ) -> Result<Self> {
        Self::with_identity(config, store, codec, scopes, cache, ContainerIdentity::issue())
    }

    /// Open a container with an explicit identity
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `config` is invalid.
    pub fn with_identity(
        config: ContainerConfig,
        store: Arc<dyn Store>,
        codec: Arc<dyn Codec<T>>,
        scopes: Arc<dyn ScopeSource>,
        cache: Arc<TransactionScopedCache<T>>,
        identity: ContainerIdentity,
    ) -> Result<Self> {
        let policy = IdentityPolicy::from_config(&config)?;
        let translator = QueryTranslator::new(config.native_columns.iter().cloned());
        debug!(
            target: "docmap::container",
            table = %config.table,
            container = %identity.id(),
            policy = ?policy.kind(),
            "container opened"
        );
        Ok(DocumentContainer {
            config,
            policy,
            translator,
            store,
            codec,
            scopes,
            cache,
            identity,
        })
    }

    /// Configuration the container was opened with
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Resolved identity policy
    pub fn policy(&self) -> &IdentityPolicy {
        &self.policy
    }

    /// Field translator
    pub fn translator(&self) -> &QueryTranslator {
        &self.translator
    }

    /// Backing table
    pub fn table(&self) -> &str {
        &self.config.table
    }

    /// Identity of this container instance
    pub fn container_id(&self) -> ContainerId {
        self.identity.id()
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn scope(&self) -> ScopeToken {
        self.scopes.current_scope()
    }

    fn cache_get(&self, scope: ScopeToken, key: &MappingKey) -> Option<ObjectRef<T>> {
        if !self.config.use_cache {
            return None;
        }
        self.cache.get(&self.identity, scope, key)
    }

    fn cache_put(&self, scope: ScopeToken, key: MappingKey, object: ObjectRef<T>) {
        if self.config.use_cache {
            self.cache.put(&self.identity, scope, key, object);
        }
    }

    fn cache_remove(&self, scope: ScopeToken, key: &MappingKey) {
        if self.config.use_cache {
            self.cache.remove(&self.identity, scope, key);
        }
    }

    fn cache_complete(&self, scope: ScopeToken) -> bool {
        self.config.use_cache && self.cache.is_complete(&self.identity, scope)
    }

    fn parent_value(&self) -> Result<Option<ParentKeyValue>> {
        Ok(self.policy.parent_value(&*self.scopes)?.cloned())
    }

    fn base_filter(&self) -> Result<QueryFragment> {
        self.policy.parent_filter(&self.translator, &*self.scopes)
    }

    fn key_filter(&self, key: &MappingKey) -> Result<QueryFragment> {
        Ok(self
            .base_filter()?
            .and(self.policy.key_filter(&self.translator, key)?))
    }

    fn id_filter(&self, base: &QueryFragment, doc_id: &DocId) -> QueryFragment {
        base.clone()
            .and(QueryFragment::eq(FieldRef::Id, doc_id.to_json()))
    }

    fn filter_for(&self, predicate: Option<&Predicate>) -> Result<QueryFragment> {
        Ok(self
            .translator
            .combine(self.base_filter()?, self.translator.translate_opt(predicate)?))
    }

    fn select_options(&self, options: &FindOptions) -> Result<SelectOptions> {
        Ok(SelectOptions {
            order_by: self.translator.order_by(&options.order_by)?,
            limit: options.limit,
            offset: options.offset,
        })
    }

    fn select_all(
        &self,
        projection: &Projection,
        filter: &QueryFragment,
        options: &SelectOptions,
    ) -> Result<Vec<Row>> {
        let rows = self
            .store
            .select(self.table(), projection, filter, options)?
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// The single row stored under `key`
    fn lookup_row(&self, key: &MappingKey, projection: &Projection) -> Result<Option<Row>> {
        let mut rows = self.select_all(projection, &self.key_filter(key)?, &SelectOptions::limit(2))?;
        if rows.len() > 1 {
            warn!(
                target: "docmap::container",
                table = %self.config.table,
                key = %key,
                "more than one row stored under key"
            );
            return Err(Error::Integrity {
                table: self.config.table.clone(),
                key: key.clone(),
            });
        }
        Ok(rows.pop())
    }

    /// Turn a stored row into a live object, preferring the cached one
    pub(crate) fn materialize(
        &self,
        scope: ScopeToken,
        row: Row,
        use_cache: bool,
    ) -> Result<(MappingKey, ObjectRef<T>)> {
        let use_cache = use_cache && self.config.use_cache;
        let key = self.policy.cache_key_for(&row)?;
        if use_cache {
            if let Some(object) = self.cache.get(&self.identity, scope, &key) {
                return Ok((key, object));
            }
        }
        let data = row
            .data
            .as_ref()
            .ok_or_else(|| Error::decode(row.id.clone(), "row was selected without its document"))?;
        let value = self.codec.decode(&row.id, data)?;
        let object = Contained::loaded(
            value,
            Identity {
                doc_id: Some(row.id),
                table: Some(self.config.table.clone()),
                name: Some(key.clone()),
                parent: self.parent_value()?,
            },
        );
        if use_cache {
            self.cache.put(&self.identity, scope, key.clone(), object.clone());
        }
        trace!(target: "docmap::container", key = %key, use_cache, "materialized row");
        Ok((key, object))
    }

    /// Update `id` in place, inserting instead when the row is gone
    fn upsert_row(&self, id: Option<&DocId>, row: NewRow) -> Result<DocId> {
        if let Some(id) = id {
            if self.store.update(self.table(), id, row.clone())? > 0 {
                return Ok(id.clone());
            }
        }
        Ok(self.store.insert(self.table(), row)?)
    }

    fn slot(&self, scope: ScopeToken, key: &MappingKey, object: &ObjectRef<T>) -> Result<Slot<T>> {
        if let Some(existing) = self.cache_get(scope, key) {
            if Contained::same(&existing, object) {
                return Ok(Slot::Unchanged);
            }
            return Ok(match existing.doc_id() {
                Some(doc_id) => Slot::Taken {
                    doc_id,
                    previous: Some(existing),
                },
                None => Slot::Vacant,
            });
        }
        if self.cache_complete(scope) {
            return Ok(Slot::Vacant);
        }
        Ok(match self.lookup_row(key, &Projection::ids())? {
            None => Slot::Vacant,
            Some(row) => {
                let identity = object.identity();
                if identity.is_in_table(self.table()) && identity.doc_id.as_ref() == Some(&row.id) {
                    Slot::Own(row.id)
                } else {
                    Slot::Taken {
                        doc_id: row.id,
                        previous: None,
                    }
                }
            }
        })
    }

    // ========================================================================
    // Mapping interface
    // ========================================================================

    /// Object stored under `key`
    ///
    /// # Errors
    ///
    /// - [`Error::KeyNotFound`] if nothing is stored under `key`
    /// - [`Error::Integrity`] if several rows claim `key`
    /// - [`Error::Decode`] or a store error otherwise
    pub fn get(&self, key: impl Into<MappingKey>) -> Result<ObjectRef<T>> {
        let key = key.into();
        let scope = self.scope();
        if let Some(object) = self.cache_get(scope, &key) {
            return Ok(object);
        }
        if self.cache_complete(scope) {
            return Err(Error::KeyNotFound(key));
        }
        match self.lookup_row(&key, &Projection::Full)? {
            Some(row) => self.materialize(scope, row, true).map(|(_, object)| object),
            None => Err(Error::KeyNotFound(key)),
        }
    }

    /// Like [`get`](Self::get), with a missing key as `None`
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), except [`Error::KeyNotFound`].
    pub fn get_opt(&self, key: impl Into<MappingKey>) -> Result<Option<ObjectRef<T>>> {
        match self.get(key) {
            Ok(object) => Ok(Some(object)),
            Err(Error::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store `object` under `key`
    ///
    /// # Errors
    ///
    /// See [`set_with`](Self::set_with).
    pub fn set(&self, key: impl Into<MappingKey>, object: &ObjectRef<T>) -> Result<MappingKey> {
        self.set_with(Some(key.into()), object, false)
    }

    /// Store `object` under the key the identity policy derives for it
    ///
    /// # Errors
    ///
    /// See [`set_with`](Self::set_with).
    pub fn add(&self, object: &ObjectRef<T>) -> Result<MappingKey> {
        self.set_with(None, object, false)
    }

    /// Store `object`, returning the key it is stored under
    ///
    /// With no explicit key the policy derives one (from the key field, a
    /// generated UUID, or the id the store assigns on insert). The key and
    /// parent key are written onto the document. An object that already
    /// owns a row of this table is updated in place instead of inserted.
    ///
    /// Setting the object already cached under `key` does nothing. A key
    /// held by another object is a collision unless `overwrite` is set, in
    /// which case the other object's row is replaced and its identity
    /// cleared.
    ///
    /// # Errors
    ///
    /// - [`Error::Identity`] if no key can be derived or an explicit key
    ///   contradicts a store-assigned one
    /// - [`Error::KeyCollision`] if `key` is taken and `overwrite` is false
    /// - [`Error::Integrity`] if several rows claim `key`
    /// - [`Error::Encode`], [`Error::Configuration`] or a store error
    ///
    /// On error neither the cache nor the object's identity is changed.
    pub fn set_with(
        &self,
        key: Option<MappingKey>,
        object: &ObjectRef<T>,
        overwrite: bool,
    ) -> Result<MappingKey> {
        let scope = self.scope();
        let table = self.table();
        let current = object.identity();
        let mut document = self.codec.encode(&object.read())?;
        let parent = self.parent_value()?;

        let key = match self.policy.resolve_key(key, &current, &document, table)? {
            KeyAssignment::Known(key) => key,
            KeyAssignment::FromStore => {
                return self.insert_with_store_key(scope, object, document, parent)
            }
        };

        let slot = self.slot(scope, &key, object)?;
        self.policy
            .stamp_document(&mut document, Some(&key), parent.as_ref())?;
        let row = NewRow::from_document(document, &self.config.native_columns);
        let owned = current
            .is_in_table(table)
            .then(|| current.doc_id.clone())
            .flatten();

        let (doc_id, previous) = match slot {
            Slot::Unchanged => {
                trace!(target: "docmap::container", key = %key, "object already stored under key");
                return Ok(key);
            }
            Slot::Vacant => (self.upsert_row(owned.as_ref(), row)?, None),
            Slot::Own(doc_id) => (self.upsert_row(Some(&doc_id), row)?, None),
            Slot::Taken { .. } if !overwrite => return Err(Error::KeyCollision(key)),
            Slot::Taken {
                doc_id: taken,
                previous,
            } => {
                let doc_id = match owned {
                    Some(own) => {
                        // the displaced row goes first; a failed delete changes nothing
                        let base = self.base_filter()?;
                        self.store.delete(table, &self.id_filter(&base, &taken))?;
                        match self.upsert_row(Some(&own), row) {
                            Ok(doc_id) => doc_id,
                            Err(e) => {
                                self.cache_remove(scope, &key);
                                if let Some(previous) = &previous {
                                    self.policy.release(previous);
                                }
                                warn!(
                                    target: "docmap::container",
                                    table,
                                    key = %key,
                                    "overwrite failed after the displaced row was deleted"
                                );
                                return Err(e);
                            }
                        }
                    }
                    None => self.upsert_row(Some(&taken), row)?,
                };
                (doc_id, previous)
            }
        };

        if let Some(old_name) = current.name.as_ref().filter(|name| **name != key) {
            if let Some(cached) = self.cache_get(scope, old_name) {
                if Contained::same(&cached, object) {
                    self.cache_remove(scope, old_name);
                }
            }
        }
        if let Some(previous) = previous {
            if !Contained::same(&previous, object) {
                self.policy.release(&previous);
            }
        }
        self.policy
            .assign_key(object, table, doc_id.clone(), key.clone(), parent);
        self.cache_put(scope, key.clone(), object.clone());
        debug!(target: "docmap::container", table, key = %key, id = %doc_id, "set");
        Ok(key)
    }

    fn insert_with_store_key(
        &self,
        scope: ScopeToken,
        object: &ObjectRef<T>,
        mut document: JsonValue,
        parent: Option<ParentKeyValue>,
    ) -> Result<MappingKey> {
        self.policy
            .stamp_document(&mut document, None, parent.as_ref())?;
        let doc_id = self.store.insert(
            self.table(),
            NewRow::from_document(document, &self.config.native_columns),
        )?;
        let key = MappingKey::from(&doc_id);
        self.policy
            .assign_key(object, self.table(), doc_id.clone(), key.clone(), parent);
        self.cache_put(scope, key.clone(), object.clone());
        debug!(target: "docmap::container", table = %self.config.table, key = %key, "set with store-assigned key");
        Ok(key)
    }

    /// Remove the object stored under `key`
    ///
    /// The row is deleted and the object's identity cleared.
    ///
    /// # Errors
    ///
    /// - [`Error::KeyNotFound`] if nothing is stored under `key`
    /// - [`Error::Integrity`] if several rows claim `key`
    /// - a store error
    pub fn delete(&self, key: impl Into<MappingKey>) -> Result<()> {
        let key = key.into();
        let scope = self.scope();
        let cached = self.cache_get(scope, &key);
        let doc_id = match cached.as_ref().and_then(|object| object.doc_id()) {
            Some(doc_id) => doc_id,
            None => {
                if cached.is_none() && self.cache_complete(scope) {
                    return Err(Error::KeyNotFound(key));
                }
                match self.lookup_row(&key, &Projection::ids())? {
                    Some(row) => row.id,
                    None => return Err(Error::KeyNotFound(key)),
                }
            }
        };

        let base = self.base_filter()?;
        let removed = self.store.delete(self.table(), &self.id_filter(&base, &doc_id))?;
        self.cache_remove(scope, &key);
        if let Some(object) = &cached {
            self.policy.release(object);
        }
        debug!(target: "docmap::container", table = %self.config.table, key = %key, removed, "delete");
        Ok(())
    }

    /// Whether anything is stored under `key`
    ///
    /// # Errors
    ///
    /// Returns a store error if the fallback count fails.
    pub fn contains(&self, key: impl Into<MappingKey>) -> Result<bool> {
        let key = key.into();
        let scope = self.scope();
        if self.cache_get(scope, &key).is_some() {
            return Ok(true);
        }
        if self.cache_complete(scope) {
            return Ok(false);
        }
        Ok(self.store.count(self.table(), &self.key_filter(&key)?)? > 0)
    }

    /// All keys
    ///
    /// Loads keys only; the cache is not marked complete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Identity`] for a stored row without a key, or a
    /// store error.
    pub fn keys(&self) -> Result<Vec<MappingKey>> {
        let scope = self.scope();
        if self.cache_complete(scope) {
            return Ok(self.cache.keys(&self.identity, scope));
        }
        let projection = self.policy.key_projection(&self.translator)?;
        self.select_all(&projection, &self.base_filter()?, &SelectOptions::default())?
            .iter()
            .map(|row| self.policy.cache_key_for(row))
            .collect()
    }

    /// All `(key, object)` pairs
    ///
    /// Cached objects are returned in place of freshly decoded ones. The
    /// cache is marked complete once every row was loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] or a store error. Rows materialized before
    /// the failure stay cached; the cache is not marked complete.
    pub fn items(&self) -> Result<Vec<(MappingKey, ObjectRef<T>)>> {
        let scope = self.scope();
        if self.cache_complete(scope) {
            return Ok(self.cache.entries(&self.identity, scope));
        }
        let filter = self.base_filter()?;
        let rows = self
            .store
            .select(self.table(), &Projection::Full, &filter, &SelectOptions::default())?;
        let mut items = Vec::new();
        for row in rows {
            items.push(self.materialize(scope, row?, true)?);
        }
        if self.config.use_cache {
            self.cache.mark_complete(&self.identity, scope);
        }
        Ok(items)
    }

    /// All objects
    ///
    /// # Errors
    ///
    /// Same as [`items`](Self::items).
    pub fn values(&self) -> Result<Vec<ObjectRef<T>>> {
        Ok(self.items()?.into_iter().map(|(_, object)| object).collect())
    }

    /// Number of stored objects matching `predicate`; always asks the store
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] or a store error.
    pub fn count(&self, predicate: Option<&Predicate>) -> Result<u64> {
        Ok(self.store.count(self.table(), &self.filter_for(predicate)?)?)
    }

    /// Number of stored objects
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn len(&self) -> Result<usize> {
        Ok(self.count(None)? as usize)
    }

    /// Whether nothing is stored
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count(None)? == 0)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Lazily iterate the objects matching `predicate`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] or a store error if the query cannot
    /// be started; later failures are yielded by the cursor.
    pub fn find(&self, predicate: Option<&Predicate>) -> Result<FindCursor<'_, T>> {
        self.find_with(predicate, &FindOptions::default())
    }

    /// [`find`](Self::find) with ordering and paging
    ///
    /// # Errors
    ///
    /// Same as [`find`](Self::find).
    pub fn find_with(
        &self,
        predicate: Option<&Predicate>,
        options: &FindOptions,
    ) -> Result<FindCursor<'_, T>> {
        let scope = self.scope();
        let filter = self.filter_for(predicate)?;
        let select = self.select_options(options)?;
        let rows = self
            .store
            .select(self.table(), &Projection::Full, &filter, &select)?;
        Ok(FindCursor::new(self, scope, rows))
    }

    /// The single object matching `predicate` and, if given, `key`
    ///
    /// With neither, the whole container must hold at most one object.
    ///
    /// # Errors
    ///
    /// - [`Error::MultipleResults`] if more than one object matches
    /// - [`Error::InvalidQuery`], [`Error::Decode`] or a store error
    pub fn find_one(
        &self,
        predicate: Option<&Predicate>,
        key: Option<&MappingKey>,
    ) -> Result<Option<ObjectRef<T>>> {
        if let (None, Some(key)) = (predicate, key) {
            return self.get_opt(key.clone());
        }
        let scope = self.scope();
        let mut filter = self.filter_for(predicate)?;
        if let Some(key) = key {
            filter = filter.and(self.policy.key_filter(&self.translator, key)?);
        }
        let mut rows = self.select_all(&Projection::Full, &filter, &SelectOptions::limit(2))?;
        if rows.len() > 1 {
            return Err(Error::MultipleResults {
                table: self.config.table.clone(),
            });
        }
        rows.pop()
            .map(|row| self.materialize(scope, row, true).map(|(_, object)| object))
            .transpose()
    }

    /// Rows matching `predicate`, undecoded
    ///
    /// `fields` picks the returned fields by public name; empty returns
    /// full rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] or a store error.
    pub fn raw_find(
        &self,
        predicate: Option<&Predicate>,
        fields: &[&str],
        options: &FindOptions,
    ) -> Result<RawRows<'_>> {
        let filter = self.filter_for(predicate)?;
        let projection = self.translator.select_fields(fields)?;
        let select = self.select_options(options)?;
        let rows = self
            .store
            .select(self.table(), &projection, &filter, &select)?;
        Ok(Box::new(rows.map(|row| row.map_err(Error::from))))
    }

    /// The single row matching `predicate`, undecoded
    ///
    /// # Errors
    ///
    /// - [`Error::MultipleResults`] if more than one row matches
    /// - [`Error::InvalidQuery`] or a store error
    pub fn raw_find_one(&self, predicate: Option<&Predicate>, fields: &[&str]) -> Result<Option<Row>> {
        let filter = self.filter_for(predicate)?;
        let projection = self.translator.select_fields(fields)?;
        let mut rows = self.select_all(&projection, &filter, &SelectOptions::limit(2))?;
        if rows.len() > 1 {
            return Err(Error::MultipleResults {
                table: self.config.table.clone(),
            });
        }
        Ok(rows.pop())
    }

    /// Materialize a full row obtained from [`raw_find`](Self::raw_find)
    ///
    /// With `use_cache` false the object is decoded afresh and not cached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Identity`] for a row without a key, or
    /// [`Error::Decode`].
    pub fn load_one(&self, row: Row, use_cache: bool) -> Result<ObjectRef<T>> {
        self.materialize(self.scope(), row, use_cache)
            .map(|(_, object)| object)
    }

    /// Write a contained object's current value back to its row
    ///
    /// # Errors
    ///
    /// - [`Error::Identity`] if the object is not stored in this table
    /// - [`Error::KeyNotFound`] if its row no longer exists
    /// - [`Error::Encode`] or a store error
    pub fn update(&self, object: &ObjectRef<T>) -> Result<()> {
        let identity = object.identity();
        let (Some(doc_id), Some(key)) = (identity.doc_id.clone(), identity.name.clone()) else {
            return Err(Error::identity("object is not stored in a container"));
        };
        if !identity.is_in_table(self.table()) {
            return Err(Error::identity(format!(
                "object '{}' is not stored in table '{}'",
                key, self.config.table
            )));
        }
        let scope = self.scope();
        let mut document = self.codec.encode(&object.read())?;
        let parent = self.parent_value()?;
        self.policy
            .stamp_document(&mut document, Some(&key), parent.as_ref())?;
        let updated = self.store.update(
            self.table(),
            &doc_id,
            NewRow::from_document(document, &self.config.native_columns),
        )?;
        if updated == 0 {
            self.cache_remove(scope, &key);
            return Err(Error::KeyNotFound(key));
        }
        self.cache_put(scope, key.clone(), object.clone());
        debug!(target: "docmap::container", table = %self.config.table, key = %key, "update");
        Ok(())
    }

    /// Remove every object
    ///
    /// Afterwards the cache knows the container is empty.
    ///
    /// # Errors
    ///
    /// Same as [`items`](Self::items), or a store error from a delete.
    /// Objects deleted before the failure stay deleted.
    pub fn clear(&self) -> Result<()> {
        let scope = self.scope();
        let items = self.items()?;
        let base = self.base_filter()?;
        for (key, object) in &items {
            if let Some(doc_id) = object.doc_id() {
                self.store.delete(self.table(), &self.id_filter(&base, &doc_id))?;
            }
            self.cache_remove(scope, key);
            self.policy.release(object);
        }
        if self.config.use_cache {
            self.cache.clear(&self.identity, scope);
        }
        debug!(target: "docmap::container", table = %self.config.table, removed = items.len(), "clear");
        Ok(())
    }

    // ========================================================================
    // Cache control
    // ========================================================================

    /// Drop this container's cache partition for the current scope
    pub fn invalidate_cache(&self) {
        self.cache.invalidate(&self.identity, self.scope());
    }

    /// Completion state of this container's partition for the current scope
    pub fn cache_state(&self) -> CacheState {
        if !self.config.use_cache {
            return CacheState::Unknown;
        }
        self.cache.cache_state(&self.identity, self.scope())
    }
}

//! Identity policies: how a container names the objects it holds
//!
//! The policy is resolved once, when the container is built, from its
//! [`ContainerConfig`]. Invalid combinations are rejected there, before the
//! store is ever touched.
//!
//! | policy | key source | parent scoping |
//! |---|---|---|
//! | [`AttributeKeyPolicy`] | a document field | optional |
//! | [`StoreGeneratedKeyPolicy`] | the store-assigned row id | optional |
//! | [`AllItemsPolicy`] | a document field, else the row id | never |

use once_cell::sync::OnceCell;

use docmap_core::{
    Contained, DocId, Error, FieldRef, Identity, JsonValue, MappingKey, ParentKeyValue,
    Projection, QueryFragment, Result, Row, ScopeSource,
};

use crate::config::{ContainerConfig, PolicyKind};
use crate::translator::QueryTranslator;

/// Parent key field plus its (possibly lazily resolved) value
#[derive(Debug)]
pub struct ParentScope {
    field: String,
    table: String,
    value: OnceCell<ParentKeyValue>,
}

impl ParentScope {
    fn new(field: String, table: String, value: Option<ParentKeyValue>) -> Self {
        let cell = OnceCell::new();
        if let Some(value) = value {
            let _ = cell.set(value);
        }
        ParentScope {
            field,
            table,
            value: cell,
        }
    }

    /// Document field holding the parent key
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The parent key value, resolving it from `scopes` on first use
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no value was configured and the
    /// scope source cannot provide one.
    pub fn value(&self, scopes: &dyn ScopeSource) -> Result<&ParentKeyValue> {
        self.value.get_or_try_init(|| {
            scopes.resolve_parent_key(&self.table).ok_or_else(|| {
                Error::configuration(format!(
                    "no parent key value for '{}' on table '{}'",
                    self.field, self.table
                ))
            })
        })
    }
}

/// Key stored in a document field
#[derive(Debug)]
pub struct AttributeKeyPolicy {
    field: String,
    generate_missing: bool,
    parent: Option<ParentScope>,
}

/// Key assigned by the store at insert time
#[derive(Debug)]
pub struct StoreGeneratedKeyPolicy {
    parent: Option<ParentScope>,
}

/// Every row of the table, keyed by a document field or by row id
#[derive(Debug)]
pub struct AllItemsPolicy {
    field: Option<String>,
}

/// How a key for `set` is obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAssignment {
    /// Key known before writing
    Known(MappingKey),
    /// Key is the id the store assigns on insert
    FromStore,
}

/// Resolved identity policy
#[derive(Debug)]
pub enum IdentityPolicy {
    /// See [`AttributeKeyPolicy`]
    AttributeKey(AttributeKeyPolicy),
    /// See [`StoreGeneratedKeyPolicy`]
    StoreGenerated(StoreGeneratedKeyPolicy),
    /// See [`AllItemsPolicy`]
    AllItems(AllItemsPolicy),
}

fn check_top_level(role: &str, field: &str) -> Result<()> {
    let ok = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '$');
    if ok {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "{} '{}' must be a top-level document field name",
            role, field
        )))
    }
}

impl IdentityPolicy {
    /// Validate `config` and resolve its policy
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for:
    /// - an empty table name
    /// - an all-items policy with a parent key value
    /// - an attribute policy without a mapping key field
    /// - a store-generated policy with a mapping key field
    /// - a parent key value without a parent key field
    /// - the same field used for both mapping key and parent key
    /// - a key or parent field that is not a top-level field name
    pub fn from_config(config: &ContainerConfig) -> Result<Self> {
        if config.table.trim().is_empty() {
            return Err(Error::configuration("table name must not be empty"));
        }
        let parent_value = config.parent_value();
        let key_field = config.effective_mapping_key_field().map(str::to_string);

        if parent_value.is_some() && config.parent_key_field.is_none() {
            return Err(Error::configuration(
                "parent key value given without a parent key field",
            ));
        }
        if let Some(field) = &key_field {
            check_top_level("mapping key field", field)?;
        }
        if let Some(field) = &config.parent_key_field {
            check_top_level("parent key field", field)?;
            if key_field.as_deref() == Some(field.as_str()) {
                return Err(Error::configuration(format!(
                    "'{}' cannot be both mapping key field and parent key field",
                    field
                )));
            }
        }

        let parent = config
            .parent_key_field
            .clone()
            .map(|field| ParentScope::new(field, config.table.clone(), parent_value.clone()));

        Ok(match config.policy {
            PolicyKind::Attribute => {
                let field = key_field.ok_or_else(|| {
                    Error::configuration("attribute policy requires a mapping key field")
                })?;
                IdentityPolicy::AttributeKey(AttributeKeyPolicy {
                    field,
                    generate_missing: config.generate_missing_keys,
                    parent,
                })
            }
            PolicyKind::StoreGenerated => {
                if let Some(field) = key_field {
                    return Err(Error::configuration(format!(
                        "store-generated keys cannot also be read from field '{}'",
                        field
                    )));
                }
                IdentityPolicy::StoreGenerated(StoreGeneratedKeyPolicy { parent })
            }
            PolicyKind::AllItems => {
                if let Some(value) = parent_value {
                    return Err(Error::configuration(format!(
                        "an all-items container cannot be scoped by parent key value {}",
                        value
                    )));
                }
                IdentityPolicy::AllItems(AllItemsPolicy { field: key_field })
            }
        })
    }

    /// Policy kind
    pub fn kind(&self) -> PolicyKind {
        match self {
            IdentityPolicy::AttributeKey(_) => PolicyKind::Attribute,
            IdentityPolicy::StoreGenerated(_) => PolicyKind::StoreGenerated,
            IdentityPolicy::AllItems(_) => PolicyKind::AllItems,
        }
    }

    /// Document field holding the mapping key, if keys are not row ids
    pub fn mapping_key_field(&self) -> Option<&str> {
        match self {
            IdentityPolicy::AttributeKey(p) => Some(&p.field),
            IdentityPolicy::StoreGenerated(_) => None,
            IdentityPolicy::AllItems(p) => p.field.as_deref(),
        }
    }

    fn parent(&self) -> Option<&ParentScope> {
        match self {
            IdentityPolicy::AttributeKey(p) => p.parent.as_ref(),
            IdentityPolicy::StoreGenerated(p) => p.parent.as_ref(),
            IdentityPolicy::AllItems(_) => None,
        }
    }

    /// Parent key field, if the container is parent-scoped
    pub fn parent_field(&self) -> Option<&str> {
        self.parent().map(ParentScope::field)
    }

    /// Parent key value, if the container is parent-scoped
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the value cannot be resolved.
    pub fn parent_value(&self, scopes: &dyn ScopeSource) -> Result<Option<&ParentKeyValue>> {
        self.parent().map(|p| p.value(scopes)).transpose()
    }

    /// Key an object would be stored under, without side effects
    ///
    /// Reads the key field from the encoded document, or the object's row
    /// id when keys are row ids.
    pub fn derive_key(&self, identity: &Identity, document: &JsonValue) -> Option<MappingKey> {
        match self.mapping_key_field() {
            Some(field) => document.get(field).and_then(MappingKey::from_json),
            None => identity.doc_id.as_ref().map(MappingKey::from),
        }
    }

    /// Decide the key for a `set`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Identity`] if no key can be derived and none may be
    /// generated, or if an explicit key contradicts a row-id key.
    pub fn resolve_key(
        &self,
        explicit: Option<MappingKey>,
        identity: &Identity,
        document: &JsonValue,
        table: &str,
    ) -> Result<KeyAssignment> {
        match self.mapping_key_field() {
            Some(field) => {
                if let Some(key) = explicit {
                    return Ok(KeyAssignment::Known(key));
                }
                if let Some(key) = self.derive_key(identity, document) {
                    return Ok(KeyAssignment::Known(key));
                }
                match self {
                    IdentityPolicy::AttributeKey(p) if p.generate_missing => {
                        Ok(KeyAssignment::Known(MappingKey::generate()))
                    }
                    _ => Err(Error::identity(format!(
                        "object has no string value for key field '{}' and no key was given",
                        field
                    ))),
                }
            }
            None => {
                let own = identity
                    .is_in_table(table)
                    .then(|| identity.doc_id.as_ref().map(MappingKey::from))
                    .flatten();
                match (explicit, own) {
                    (None, None) => Ok(KeyAssignment::FromStore),
                    (None, Some(own)) => Ok(KeyAssignment::Known(own)),
                    (Some(key), Some(own)) if key == own => Ok(KeyAssignment::Known(key)),
                    (Some(key), _) => Err(Error::identity(format!(
                        "key '{}' is not the store id of the object; keys are assigned by the store",
                        key
                    ))),
                }
            }
        }
    }

    /// Write the key and parent key onto an encoded document
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the document is not a JSON object.
    pub fn stamp_document(
        &self,
        document: &mut JsonValue,
        key: Option<&MappingKey>,
        parent: Option<&ParentKeyValue>,
    ) -> Result<()> {
        let object = document
            .as_object_mut()
            .ok_or_else(|| Error::encode("document is not a JSON object"))?;
        if let (Some(field), Some(key)) = (self.mapping_key_field(), key) {
            if object.get(field).and_then(JsonValue::as_str) != Some(key.as_str()) {
                object.insert(field.to_string(), key.to_json());
            }
        }
        if let (Some(field), Some(parent)) = (self.parent_field(), parent) {
            object.insert(field.to_string(), parent.as_json().clone());
        }
        Ok(())
    }

    /// Attach the container identity to an object after a successful write
    ///
    /// Idempotent for the same key.
    pub fn assign_key<T>(
        &self,
        object: &Contained<T>,
        table: &str,
        doc_id: DocId,
        key: MappingKey,
        parent: Option<ParentKeyValue>,
    ) {
        object.attach(Identity {
            doc_id: Some(doc_id),
            table: Some(table.to_string()),
            name: Some(key),
            parent,
        });
    }

    /// Clear an object's identity once its row is gone
    pub fn release<T>(&self, object: &Contained<T>) {
        object.attach(Identity::default());
    }

    /// Key of a stored row (full or key-projected)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Identity`] if the row has no string key.
    pub fn cache_key_for(&self, row: &Row) -> Result<MappingKey> {
        let Some(field) = self.mapping_key_field() else {
            return Ok(MappingKey::from(&row.id));
        };
        let value = match &row.data {
            Some(data) => data.get(field).cloned(),
            None => row.columns.get(field).cloned(),
        };
        value
            .as_ref()
            .and_then(MappingKey::from_json)
            .ok_or_else(|| {
                Error::identity(format!(
                    "row {} has no string value for key field '{}'",
                    row.id, field
                ))
            })
    }

    /// Filter selecting the row stored under `key`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if the key field does not resolve.
    pub fn key_filter(&self, translator: &QueryTranslator, key: &MappingKey) -> Result<QueryFragment> {
        let field = match self.mapping_key_field() {
            Some(field) => translator.resolve_field(field)?,
            None => FieldRef::Id,
        };
        Ok(QueryFragment::eq(field, key.to_json()))
    }

    /// Projection returning just enough of a row to compute its key
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if the key field does not resolve.
    pub fn key_projection(&self, translator: &QueryTranslator) -> Result<Projection> {
        match self.mapping_key_field() {
            Some(field) => translator.select_fields(&[field]),
            None => Ok(Projection::ids()),
        }
    }

    /// Filter restricting a table to this container's rows
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the parent key value cannot be
    /// resolved.
    pub fn parent_filter(
        &self,
        translator: &QueryTranslator,
        scopes: &dyn ScopeSource,
    ) -> Result<QueryFragment> {
        match self.parent() {
            None => Ok(QueryFragment::MatchAll),
            Some(parent) => {
                let value = parent.value(scopes)?;
                let field = translator.resolve_field(parent.field())?;
                Ok(QueryFragment::eq(field, value.as_json().clone()))
            }
        }
    }
}

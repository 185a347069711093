//! Container configuration, loadable from TOML
//!
//! A config names the backing table and picks an identity policy. It is
//! plain data: nothing is validated until
//! [`IdentityPolicy::from_config`](crate::identity::IdentityPolicy::from_config)
//! resolves it, which every container constructor does before touching the
//! store.

use serde::{Deserialize, Serialize};
use std::path::Path;

use docmap_core::{Error, JsonValue, ParentKeyValue, Result};

/// Mapping key field used by the attribute policy when none is configured
pub const DEFAULT_MAPPING_KEY_FIELD: &str = "key";

/// Parent key field used by [`ContainerConfig::with_parent_value`] when none is configured
pub const DEFAULT_PARENT_KEY_FIELD: &str = "parent";

/// How mapping keys are obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Key read from / written to a document field
    #[default]
    Attribute,
    /// Key is the store-assigned row id
    StoreGenerated,
    /// Whole table, no parent scoping
    AllItems,
}

/// Container configuration
///
/// # Example
///
/// ```toml
/// table = "person"
/// native_columns = ["name"]
/// policy = "attribute"
/// mapping_key_field = "key"
/// parent_key_field = "parent"
/// parent_key_value = "people"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Backing table
    pub table: String,
    /// Columns stored natively next to the document blob (besides `id`)
    #[serde(default)]
    pub native_columns: Vec<String>,
    /// Document field holding the mapping key
    ///
    /// Defaults to `"key"` for the attribute policy and to none otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_key_field: Option<String>,
    /// Document field holding the parent key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key_field: Option<String>,
    /// Parent key value; resolved from the scope source when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key_value: Option<JsonValue>,
    /// Identity policy
    #[serde(default)]
    pub policy: PolicyKind,
    /// Generate a UUID key when an attribute-keyed object has none
    #[serde(default)]
    pub generate_missing_keys: bool,
    /// Serve reads from the transaction-scoped cache
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

impl ContainerConfig {
    /// Attribute-keyed config over `table`, no parent scoping
    pub fn new(table: impl Into<String>) -> Self {
        ContainerConfig {
            table: table.into(),
            native_columns: Vec::new(),
            mapping_key_field: None,
            parent_key_field: None,
            parent_key_value: None,
            policy: PolicyKind::Attribute,
            generate_missing_keys: false,
            use_cache: true,
        }
    }

    /// Set the identity policy
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Set the mapping key field
    pub fn with_mapping_key_field(mut self, field: impl Into<String>) -> Self {
        self.mapping_key_field = Some(field.into());
        self
    }

    /// Set the parent key field
    pub fn with_parent_key_field(mut self, field: impl Into<String>) -> Self {
        self.parent_key_field = Some(field.into());
        self
    }

    /// Set the parent key value, using the default parent field if none is set
    pub fn with_parent_value(mut self, value: impl Into<JsonValue>) -> Self {
        if self.parent_key_field.is_none() {
            self.parent_key_field = Some(DEFAULT_PARENT_KEY_FIELD.to_string());
        }
        self.parent_key_value = Some(value.into());
        self
    }

    /// Declare native columns
    pub fn with_native_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.native_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable local key generation
    pub fn with_generated_keys(mut self, enabled: bool) -> Self {
        self.generate_missing_keys = enabled;
        self
    }

    /// Enable or disable the cache
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Mapping key field after applying the policy default
    pub fn effective_mapping_key_field(&self) -> Option<&str> {
        match (&self.mapping_key_field, self.policy) {
            (Some(field), _) => Some(field),
            (None, PolicyKind::Attribute) => Some(DEFAULT_MAPPING_KEY_FIELD),
            (None, _) => None,
        }
    }

    /// Configured parent key value; `null` counts as absent
    pub fn parent_value(&self) -> Option<ParentKeyValue> {
        self.parent_key_value
            .as_ref()
            .filter(|v| !v.is_null())
            .map(|v| ParentKeyValue::new(v.clone()))
    }

    /// Parse a config from TOML text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the text does not parse.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| Error::configuration(format!("failed to parse container config: {}", e)))
    }

    /// Read and parse a config file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::configuration(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Serialize to TOML
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the config cannot be represented
    /// in TOML (for example a `null` parent key value).
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("failed to serialize container config: {}", e)))
    }

    /// Commented template config
    pub fn default_toml() -> &'static str {
        r#"# docmap container configuration
#
# Backing table (required)
table = "items"

# Columns stored natively next to the document blob, besides "id"
native_columns = []

# Identity policy: "attribute" (default), "store_generated" or "all_items"
#   "attribute"       = key read from mapping_key_field (default "key")
#   "store_generated" = key is the store-assigned row id
#   "all_items"       = whole table, no parent scoping
policy = "attribute"

# mapping_key_field = "key"

# Several containers may share a table; each scopes its rows by a parent key.
# When parent_key_value is omitted it is resolved from the scope source.
# parent_key_field = "parent"
# parent_key_value = "my-container"

# Generate a UUID key when an object has none (attribute policy only)
generate_missing_keys = false

# Serve reads from the transaction-scoped cache
use_cache = true
"#
    }
}

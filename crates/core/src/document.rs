//! Row shapes exchanged with a document store
//!
//! A table row is the native `id` column, zero or more declared native
//! columns, and a JSON document blob (`data`). Selects with a field
//! projection return rows without a blob.

use crate::json::JsonValue;
use crate::types::{DocId, ID_COLUMN};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row returned by a select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Native identifier
    pub id: DocId,
    /// Native columns, or projected fields keyed by alias
    pub columns: BTreeMap<String, JsonValue>,
    /// The document blob; `None` for field projections
    pub data: Option<JsonValue>,
}

impl Row {
    /// Value of an output field by alias (`id` is always available)
    pub fn field(&self, alias: &str) -> Option<JsonValue> {
        if alias == ID_COLUMN {
            return Some(self.id.to_json());
        }
        self.columns.get(alias).cloned()
    }

    /// All output fields including `id`, keyed by alias
    pub fn to_record(&self) -> BTreeMap<String, JsonValue> {
        let mut record = self.columns.clone();
        record.insert(ID_COLUMN.to_string(), self.id.to_json());
        record
    }
}

/// Payload for an insert or full-row update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewRow {
    /// Native column values
    pub columns: BTreeMap<String, JsonValue>,
    /// Document blob
    pub data: JsonValue,
}

impl NewRow {
    /// Build a row from a document, lifting the named native columns out of it
    ///
    /// Native columns are copied, not moved: the blob stays complete so that
    /// decoding never depends on the table layout.
    pub fn from_document(data: JsonValue, native_columns: &[String]) -> Self {
        let columns = native_columns
            .iter()
            .filter_map(|name| data.get(name).map(|v| (name.clone(), v.clone())))
            .collect();
        NewRow { columns, data }
    }
}

//! Query translation from public field names to backend fragments
//!
//! A table row has native columns (`id` plus the declared ones) and a JSON
//! document. Callers address both with plain field names; the translator
//! decides which is which:
//!
//! - `id` and declared native columns resolve to column references
//! - anything else is a dotted path into the document (`a.b.c`, `items[0]`)

use rustc_hash::FxHashSet;

use docmap_core::{
    Error, FieldRef, JsonPath, OrderBy, Predicate, Projection, QueryFragment, Result, Selection,
    ID_COLUMN,
};

/// Sort key over a public field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Public field name
    pub field: String,
    /// Descending instead of ascending
    pub descending: bool,
}

impl SortKey {
    /// Ascending on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            descending: false,
        }
    }

    /// Descending on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            descending: true,
        }
    }
}

/// Resolves field names against a table's native columns
#[derive(Debug, Clone, Default)]
pub struct QueryTranslator {
    native_columns: FxHashSet<String>,
}

impl QueryTranslator {
    /// Translator for a table with the given native columns
    pub fn new<I, S>(native_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryTranslator {
            native_columns: native_columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` is stored natively
    pub fn is_native(&self, name: &str) -> bool {
        name == ID_COLUMN || self.native_columns.contains(name)
    }

    /// Resolve a public field name
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if a document path does not parse.
    pub fn resolve_field(&self, name: &str) -> Result<FieldRef> {
        if name == ID_COLUMN {
            return Ok(FieldRef::Id);
        }
        if self.native_columns.contains(name) {
            return Ok(FieldRef::Column(name.to_string()));
        }
        if name.is_empty() {
            return Err(Error::invalid_query("empty field name"));
        }
        name.parse::<JsonPath>()
            .map(FieldRef::Document)
            .map_err(|e| Error::invalid_query(format!("bad field '{}': {}", name, e)))
    }

    /// Output name of a projected field (`.` replaced by `_`)
    pub fn alias_for(&self, name: &str) -> String {
        name.replace('.', "_")
    }

    /// Conjunction of the container's base filter and an optional caller filter
    ///
    /// A caller filter that matches everything counts as absent.
    pub fn combine(&self, parent: QueryFragment, caller: Option<QueryFragment>) -> QueryFragment {
        match caller {
            None | Some(QueryFragment::MatchAll) => parent,
            Some(caller) if parent.is_match_all() => caller,
            Some(caller) => parent.and(caller),
        }
    }

    /// Lower a caller predicate
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if any field name does not resolve.
    pub fn translate(&self, predicate: &Predicate) -> Result<QueryFragment> {
        Ok(match predicate {
            Predicate::Compare { field, op, value } => QueryFragment::Compare {
                field: self.resolve_field(field)?,
                op: *op,
                value: value.clone(),
            },
            Predicate::And(parts) => QueryFragment::And(
                parts
                    .iter()
                    .map(|p| self.translate(p))
                    .collect::<Result<_>>()?,
            ),
            Predicate::Or(parts) => QueryFragment::Or(
                parts
                    .iter()
                    .map(|p| self.translate(p))
                    .collect::<Result<_>>()?,
            ),
            Predicate::Not(inner) => QueryFragment::Not(Box::new(self.translate(inner)?)),
        })
    }

    /// Lower an optional caller predicate
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if any field name does not resolve.
    pub fn translate_opt(&self, predicate: Option<&Predicate>) -> Result<Option<QueryFragment>> {
        predicate.map(|p| self.translate(p)).transpose()
    }

    /// Projection for a list of public field names
    ///
    /// An empty list selects the full row. Otherwise native columns are
    /// selected as columns, everything else as document accessors, and
    /// names are deduplicated on their output alias. `id` is always part of
    /// a row and never listed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if a document path does not parse.
    pub fn select_fields(&self, names: &[&str]) -> Result<Projection> {
        if names.is_empty() {
            return Ok(Projection::Full);
        }
        let mut seen = FxHashSet::default();
        let mut selections = Vec::with_capacity(names.len());
        for name in names {
            if *name == ID_COLUMN {
                continue;
            }
            let alias = self.alias_for(name);
            if !seen.insert(alias.clone()) {
                continue;
            }
            let selection = match self.resolve_field(name)? {
                FieldRef::Column(column) => Selection::Column(column),
                FieldRef::Document(path) => Selection::Accessor { path, alias },
                FieldRef::Id => continue,
            };
            selections.push(selection);
        }
        Ok(Projection::Fields(selections))
    }

    /// Resolve sort keys
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuery`] if a field name does not resolve.
    pub fn order_by(&self, keys: &[SortKey]) -> Result<Vec<OrderBy>> {
        keys.iter()
            .map(|k| {
                Ok(OrderBy {
                    field: self.resolve_field(&k.field)?,
                    descending: k.descending,
                })
            })
            .collect()
    }
}

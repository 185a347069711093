//! Query vocabulary shared by containers and stores
//!
//! Two levels exist:
//! - [`Predicate`]: what callers write, over public field *names*
//! - [`QueryFragment`]: what stores execute, over resolved [`FieldRef`]s
//!
//! The container's translator lowers the first into the second; stores
//! never see field names that have not been resolved against the table's
//! native columns.

use crate::document::Row;
use crate::json::{compare_values, get_at_path, values_equal, JsonPath, JsonValue};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `field == value`
    Eq,
    /// `field != value` (missing fields match)
    Ne,
    /// `field < value`
    Lt,
    /// `field <= value`
    Le,
    /// `field > value`
    Gt,
    /// `field >= value`
    Ge,
    /// `field` equals one element of the array `value`
    In,
    /// `field` equals no element of the array `value`
    NotIn,
    /// string `field` starts with string `value`
    StartsWith,
    /// `field` presence (non-null) equals boolean `value`
    Exists,
}

impl Operator {
    /// Evaluate the operator against a (possibly missing) field value
    pub fn evaluate(&self, field: Option<&JsonValue>, value: &JsonValue) -> bool {
        let present = field.filter(|v| !v.is_null());
        match self {
            Operator::Eq => field.map_or(value.is_null(), |f| values_equal(f, value)),
            Operator::Ne => !field.map_or(value.is_null(), |f| values_equal(f, value)),
            Operator::Lt => ordered(present, value, |o| o == Ordering::Less),
            Operator::Le => ordered(present, value, |o| o != Ordering::Greater),
            Operator::Gt => ordered(present, value, |o| o == Ordering::Greater),
            Operator::Ge => ordered(present, value, |o| o != Ordering::Less),
            Operator::In => match (present, value.as_array()) {
                (Some(f), Some(items)) => items.iter().any(|v| values_equal(f, v)),
                _ => false,
            },
            Operator::NotIn => match (present, value.as_array()) {
                (Some(f), Some(items)) => !items.iter().any(|v| values_equal(f, v)),
                (None, Some(_)) => true,
                _ => false,
            },
            Operator::StartsWith => match (present.and_then(|f| f.as_str()), value.as_str()) {
                (Some(f), Some(prefix)) => f.starts_with(prefix),
                _ => false,
            },
            Operator::Exists => present.is_some() == value.as_bool().unwrap_or(true),
        }
    }
}

fn ordered(field: Option<&JsonValue>, value: &JsonValue, accept: impl Fn(Ordering) -> bool) -> bool {
    field
        .and_then(|f| compare_values(f, value))
        .map_or(false, accept)
}

/// A resolved reference to a value in a stored row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldRef {
    /// The native `id` column
    Id,
    /// A declared native column
    Column(String),
    /// A (possibly nested) field inside the document blob
    Document(JsonPath),
}

impl FieldRef {
    /// Read the referenced value from a full row
    pub fn read<'a>(&self, row: &'a Row) -> Option<Cow<'a, JsonValue>> {
        match self {
            FieldRef::Id => Some(Cow::Owned(row.id.to_json())),
            FieldRef::Column(name) => row.columns.get(name).map(Cow::Borrowed),
            FieldRef::Document(path) => row
                .data
                .as_ref()
                .and_then(|data| get_at_path(data, path))
                .map(Cow::Borrowed),
        }
    }
}

/// Backend query fragment: the filter shape a [`Store`](crate::traits::Store) executes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryFragment {
    /// Matches every row
    MatchAll,
    /// Single comparison
    Compare {
        /// Field being compared
        field: FieldRef,
        /// Operator
        op: Operator,
        /// Right-hand side
        value: JsonValue,
    },
    /// All sub-fragments match
    And(Vec<QueryFragment>),
    /// At least one sub-fragment matches
    Or(Vec<QueryFragment>),
    /// The sub-fragment does not match
    Not(Box<QueryFragment>),
}

impl QueryFragment {
    /// Equality comparison
    pub fn eq(field: FieldRef, value: impl Into<JsonValue>) -> Self {
        QueryFragment::Compare {
            field,
            op: Operator::Eq,
            value: value.into(),
        }
    }

    /// Whether this fragment is the "match all" filter
    pub fn is_match_all(&self) -> bool {
        matches!(self, QueryFragment::MatchAll)
    }

    /// Conjunction, flattening nested `And`s and dropping `MatchAll`
    pub fn and(self, other: QueryFragment) -> QueryFragment {
        match (self, other) {
            (QueryFragment::MatchAll, f) | (f, QueryFragment::MatchAll) => f,
            (QueryFragment::And(mut a), QueryFragment::And(b)) => {
                a.extend(b);
                QueryFragment::And(a)
            }
            (QueryFragment::And(mut a), f) => {
                a.push(f);
                QueryFragment::And(a)
            }
            (f, QueryFragment::And(mut b)) => {
                b.insert(0, f);
                QueryFragment::And(b)
            }
            (a, b) => QueryFragment::And(vec![a, b]),
        }
    }

    /// Evaluate the fragment against a row
    ///
    /// Reference semantics for in-process stores; a relational backend
    /// renders the same fragment into its own dialect instead.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            QueryFragment::MatchAll => true,
            QueryFragment::Compare { field, op, value } => {
                let current = field.read(row);
                op.evaluate(current.as_deref(), value)
            }
            QueryFragment::And(parts) => parts.iter().all(|p| p.matches(row)),
            QueryFragment::Or(parts) => parts.iter().any(|p| p.matches(row)),
            QueryFragment::Not(inner) => !inner.matches(row),
        }
    }
}

/// Caller-level predicate over public field names
///
/// ```
/// use docmap_core::query::Predicate;
///
/// let adults_named_ro = Predicate::ge("age", 18).and(Predicate::starts_with("name", "Ro"));
/// assert_eq!(adults_named_ro.field_names(), vec!["age", "name"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Single comparison on a named field (`id`, a native column, or a dotted document path)
    Compare {
        /// Public field name
        field: String,
        /// Operator
        op: Operator,
        /// Right-hand side
        value: JsonValue,
    },
    /// All sub-predicates hold
    And(Vec<Predicate>),
    /// At least one sub-predicate holds
    Or(Vec<Predicate>),
    /// The sub-predicate does not hold
    Not(Box<Predicate>),
}

impl Predicate {
    /// Generic comparison constructor
    pub fn compare(field: impl Into<String>, op: Operator, value: impl Into<JsonValue>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::compare(field, Operator::Eq, value)
    }

    /// `field != value`
    pub fn ne(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::compare(field, Operator::Ne, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::compare(field, Operator::Lt, value)
    }

    /// `field <= value`
    pub fn le(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::compare(field, Operator::Le, value)
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::compare(field, Operator::Gt, value)
    }

    /// `field >= value`
    pub fn ge(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::compare(field, Operator::Ge, value)
    }

    /// `field` is one of `values`
    pub fn is_in<V: Into<JsonValue>>(field: impl Into<String>, values: Vec<V>) -> Self {
        let values: Vec<JsonValue> = values.into_iter().map(Into::into).collect();
        Self::compare(field, Operator::In, values)
    }

    /// `field` is none of `values`
    pub fn not_in<V: Into<JsonValue>>(field: impl Into<String>, values: Vec<V>) -> Self {
        let values: Vec<JsonValue> = values.into_iter().map(Into::into).collect();
        Self::compare(field, Operator::NotIn, values)
    }

    /// string `field` starts with `prefix`
    pub fn starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::compare(field, Operator::StartsWith, prefix.into())
    }

    /// `field` is present (`true`) or absent (`false`)
    pub fn exists(field: impl Into<String>, present: bool) -> Self {
        Self::compare(field, Operator::Exists, present)
    }

    /// Conjunction
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            p => Predicate::And(vec![p, other]),
        }
    }

    /// Disjunction
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut parts) => {
                parts.push(other);
                Predicate::Or(parts)
            }
            p => Predicate::Or(vec![p, other]),
        }
    }

    /// Negation
    pub fn negate(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Field names referenced, in order of first appearance
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field);
                }
            }
            Predicate::And(parts) | Predicate::Or(parts) => {
                for p in parts {
                    p.collect_names(out);
                }
            }
            Predicate::Not(inner) => inner.collect_names(out),
        }
    }
}

/// One projected output field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// A native column, returned under its own name
    Column(String),
    /// A document accessor, returned under `alias`
    Accessor {
        /// Path into the document blob
        path: JsonPath,
        /// Output name (`.` replaced by `_`)
        alias: String,
    },
}

impl Selection {
    /// Output name of this selection
    pub fn alias(&self) -> &str {
        match self {
            Selection::Column(name) => name,
            Selection::Accessor { alias, .. } => alias,
        }
    }
}

/// What a select returns per row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// `id`, every native column and the document blob
    Full,
    /// `id` plus the listed selections; no blob
    Fields(Vec<Selection>),
}

impl Projection {
    /// Identifier-only projection
    pub fn ids() -> Self {
        Projection::Fields(Vec::new())
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Resolved field
    pub field: FieldRef,
    /// Descending instead of ascending
    pub descending: bool,
}

/// Ordering and paging for a select
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOptions {
    /// Sort keys, most significant first; insertion order when empty
    pub order_by: Vec<OrderBy>,
    /// Maximum number of rows
    pub limit: Option<usize>,
    /// Rows to skip before the first returned row
    pub offset: usize,
}

impl SelectOptions {
    /// Options with only a row limit
    pub fn limit(limit: usize) -> Self {
        SelectOptions {
            limit: Some(limit),
            ..Default::default()
        }
    }
}

//! Adapter for the legacy filter mini-language
//!
//! Older callers describe filters as JSON objects:
//!
//! ```text
//! {"name": "Roy"}                              equality
//! {"age": {"$gte": 18, "$lt": 65}}             operators, AND-ed
//! {"tags": {"$in": ["a", "b"]}, "x": 1}        fields, AND-ed
//! ```
//!
//! Supported operators: `$eq`, `$ne`, `$lt`, `$lte`, `$gt`, `$gte`, `$in`,
//! `$nin`, `$exists`, `$startswith`. Anything else is rejected. New code
//! should build a [`Predicate`] directly.

use docmap_core::{Error, JsonValue, Operator, Predicate, Result};

fn operator(name: &str) -> Option<Operator> {
    Some(match name {
        "$eq" => Operator::Eq,
        "$ne" => Operator::Ne,
        "$lt" => Operator::Lt,
        "$lte" => Operator::Le,
        "$gt" => Operator::Gt,
        "$gte" => Operator::Ge,
        "$in" => Operator::In,
        "$nin" => Operator::NotIn,
        "$exists" => Operator::Exists,
        "$startswith" => Operator::StartsWith,
        _ => return None,
    })
}

fn is_operator_object(value: &JsonValue) -> bool {
    value
        .as_object()
        .map_or(false, |o| !o.is_empty() && o.keys().all(|k| k.starts_with('$')))
}

/// Lower a legacy filter object into a [`Predicate`]
///
/// Returns `Ok(None)` for `null` or `{}` (no filter).
///
/// # Errors
///
/// Returns [`Error::InvalidQuery`] for a non-object filter, an unknown
/// operator, or an operand of the wrong shape.
#[deprecated(note = "build a `Predicate` instead of a legacy filter object")]
pub fn lower_legacy_filter(filter: &JsonValue) -> Result<Option<Predicate>> {
    let fields = match filter {
        JsonValue::Null => return Ok(None),
        JsonValue::Object(fields) => fields,
        other => {
            return Err(Error::invalid_query(format!(
                "legacy filter must be an object, got {}",
                other
            )))
        }
    };

    let mut clauses = Vec::new();
    for (field, condition) in fields {
        if field.starts_with('$') {
            return Err(Error::invalid_query(format!(
                "operator '{}' is not allowed at the top level",
                field
            )));
        }
        if !is_operator_object(condition) {
            clauses.push(Predicate::eq(field.as_str(), condition.clone()));
            continue;
        }
        for (name, operand) in condition.as_object().into_iter().flatten() {
            let op = operator(name)
                .ok_or_else(|| Error::invalid_query(format!("unknown operator '{}'", name)))?;
            match op {
                Operator::In | Operator::NotIn if !operand.is_array() => {
                    return Err(Error::invalid_query(format!("'{}' expects an array", name)))
                }
                Operator::Exists if !operand.is_boolean() => {
                    return Err(Error::invalid_query("'$exists' expects a boolean"))
                }
                Operator::StartsWith if !operand.is_string() => {
                    return Err(Error::invalid_query("'$startswith' expects a string"))
                }
                _ => {}
            }
            clauses.push(Predicate::compare(field.as_str(), op, operand.clone()));
        }
    }

    Ok(match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(Predicate::And(clauses)),
    })
}

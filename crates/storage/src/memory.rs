//! MemoryStore: in-process document store
//!
//! This module implements the Store trait using:
//! - `FxHashMap<String, Vec<StoredRow>>` for tables, rows kept in insertion order
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for monotonically increasing row identifiers
//!
//! # Design Notes
//!
//! - **Snapshot cursors**: a select evaluates its filter under the read lock
//!   and hands back an owning cursor, so no lock is held while the caller
//!   iterates.
//! - **NULL projection**: a projected field missing from a row is returned
//!   as `null`, the way a relational backend returns NULL for an absent
//!   JSON accessor.
//! - **Ordering**: missing and `null` values sort first; values of
//!   different kinds compare equal and keep insertion order.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use docmap_core::{
    compare_values, get_at_path, DocId, JsonValue, NewRow, OrderBy, Projection, QueryFragment,
    Row, RowCursor, SelectOptions, Selection, Store, StoreError, StoreResult,
};

use crate::fault::{FaultInjector, StoreOp};
use crate::stats::QueryStats;

#[derive(Debug, Clone)]
struct StoredRow {
    id: DocId,
    columns: BTreeMap<String, JsonValue>,
    data: JsonValue,
}

impl StoredRow {
    fn to_row(&self) -> Row {
        Row {
            id: self.id.clone(),
            columns: self.columns.clone(),
            data: Some(self.data.clone()),
        }
    }
}

/// In-process document store
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`. Every call
/// through the [`Store`] trait is counted in [`MemoryStore::stats`] and can
/// be made to fail through [`MemoryStore::faults`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<FxHashMap<String, Vec<StoredRow>>>,
    next_id: AtomicU64,
    stats: QueryStats,
    faults: FaultInjector,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation counters
    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    /// Failure injection
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Full copy of a table's rows, in insertion order
    ///
    /// Inspection helper; not counted in the stats.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .read()
            .get(table)
            .map(|rows| rows.iter().map(StoredRow::to_row).collect())
            .unwrap_or_default()
    }

    /// Number of rows in a table; not counted in the stats
    pub fn table_len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, Vec::len)
    }

    /// Allocate the next row identifier
    ///
    /// Identifiers are zero-padded hex so that lexical order follows
    /// allocation order.
    fn next_doc_id(&self) -> DocId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        DocId::new(format!("{:024x}", n))
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        match self.faults.take(op) {
            Some(err) => {
                trace!(target: "docmap::store", ?op, error = %err, "injected failure");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

fn project(row: Row, projection: &Projection) -> Row {
    match projection {
        Projection::Full => row,
        Projection::Fields(selections) => {
            let data = row.data.unwrap_or(JsonValue::Null);
            let columns = selections
                .iter()
                .map(|sel| {
                    let value = match sel {
                        Selection::Column(name) => row.columns.get(name).cloned(),
                        Selection::Accessor { path, .. } => get_at_path(&data, path).cloned(),
                    };
                    (sel.alias().to_string(), value.unwrap_or(JsonValue::Null))
                })
                .collect();
            Row {
                id: row.id,
                columns,
                data: None,
            }
        }
    }
}

fn compare_rows(a: &Row, b: &Row, order_by: &[OrderBy]) -> CmpOrdering {
    for key in order_by {
        let left = key.field.read(a);
        let right = key.field.read(b);
        let left = left.as_deref().filter(|v| !v.is_null());
        let right = right.as_deref().filter(|v| !v.is_null());
        let ord = match (left, right) {
            (None, None) => CmpOrdering::Equal,
            (None, Some(_)) => CmpOrdering::Less,
            (Some(_), None) => CmpOrdering::Greater,
            (Some(l), Some(r)) => compare_values(l, r).unwrap_or(CmpOrdering::Equal),
        };
        let ord = if key.descending { ord.reverse() } else { ord };
        if ord != CmpOrdering::Equal {
            return ord;
        }
    }
    CmpOrdering::Equal
}

/// Cursor over a select's matched rows, optionally failing part-way
struct SnapshotCursor {
    rows: std::vec::IntoIter<Row>,
    yielded: usize,
    failure: Option<(usize, StoreError)>,
}

impl Iterator for SnapshotCursor {
    type Item = StoreResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(&self.failure, Some((after, _)) if *after == self.yielded) {
            return self.failure.take().map(|(_, err)| Err(err));
        }
        let row = self.rows.next()?;
        self.yielded += 1;
        Some(Ok(row))
    }
}

impl Store for MemoryStore {
    fn select(
        &self,
        table: &str,
        projection: &Projection,
        filter: &QueryFragment,
        options: &SelectOptions,
    ) -> StoreResult<RowCursor<'_>> {
        self.stats.record_select();
        self.check(StoreOp::Select)?;

        let mut matched: Vec<Row> = {
            let tables = self.tables.read();
            tables
                .get(table)
                .map(|rows| {
                    rows.iter()
                        .map(StoredRow::to_row)
                        .filter(|row| filter.matches(row))
                        .collect()
                })
                .unwrap_or_default()
        };

        if !options.order_by.is_empty() {
            matched.sort_by(|a, b| compare_rows(a, b, &options.order_by));
        }
        let limit = options.limit.unwrap_or(usize::MAX);
        let rows: Vec<Row> = matched
            .into_iter()
            .skip(options.offset)
            .take(limit)
            .map(|row| project(row, projection))
            .collect();

        trace!(target: "docmap::store", table, rows = rows.len(), "select");
        Ok(Box::new(SnapshotCursor {
            rows: rows.into_iter(),
            yielded: 0,
            failure: self.faults.take_cursor_failure(),
        }))
    }

    fn count(&self, table: &str, filter: &QueryFragment) -> StoreResult<u64> {
        self.stats.record_count();
        self.check(StoreOp::Count)?;
        let tables = self.tables.read();
        let n = tables.get(table).map_or(0, |rows| {
            rows.iter().filter(|r| filter.matches(&r.to_row())).count()
        });
        trace!(target: "docmap::store", table, n, "count");
        Ok(n as u64)
    }

    fn insert(&self, table: &str, row: NewRow) -> StoreResult<DocId> {
        self.stats.record_insert();
        self.check(StoreOp::Insert)?;
        let id = self.next_doc_id();
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(StoredRow {
                id: id.clone(),
                columns: row.columns,
                data: row.data,
            });
        trace!(target: "docmap::store", table, id = %id, "insert");
        Ok(id)
    }

    fn update(&self, table: &str, id: &DocId, row: NewRow) -> StoreResult<u64> {
        self.stats.record_update();
        self.check(StoreOp::Update)?;
        let mut tables = self.tables.write();
        let Some(stored) = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| &r.id == id))
        else {
            return Ok(0);
        };
        stored.columns = row.columns;
        stored.data = row.data;
        trace!(target: "docmap::store", table, id = %id, "update");
        Ok(1)
    }

    fn delete(&self, table: &str, filter: &QueryFragment) -> StoreResult<u64> {
        self.stats.record_delete();
        self.check(StoreOp::Delete)?;
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !filter.matches(&r.to_row()));
        let removed = (before - rows.len()) as u64;
        trace!(target: "docmap::store", table, removed, "delete");
        Ok(removed)
    }
}

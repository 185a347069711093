//! Lazy result cursors

use docmap_core::{ObjectRef, Result, RowCursor, ScopeToken};

use crate::container::DocumentContainer;

/// Single-pass cursor over the objects matched by a `find`
///
/// Each row is decoded (or taken from the cache) only when the cursor
/// reaches it. The cursor fuses after the first error: rows decoded before
/// the error stay cached, nothing after it is read.
pub struct FindCursor<'a, T> {
    container: &'a DocumentContainer<T>,
    scope: ScopeToken,
    rows: RowCursor<'a>,
    done: bool,
}

impl<'a, T: Send + Sync + 'static> FindCursor<'a, T> {
    pub(crate) fn new(
        container: &'a DocumentContainer<T>,
        scope: ScopeToken,
        rows: RowCursor<'a>,
    ) -> Self {
        FindCursor {
            container,
            scope,
            rows,
            done: false,
        }
    }
}

impl<'a, T: Send + Sync + 'static> Iterator for FindCursor<'a, T> {
    type Item = Result<ObjectRef<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.rows.next()? {
            Ok(row) => self
                .container
                .materialize(self.scope, row, true)
                .map(|(_, object)| object),
            Err(e) => Err(e.into()),
        };
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl<T> std::fmt::Debug for FindCursor<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindCursor")
            .field("scope", &self.scope)
            .field("done", &self.done)
            .finish()
    }
}

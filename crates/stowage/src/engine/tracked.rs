use stowage_core::stmt::{TableValue, Value};

use std::collections::{HashMap, HashSet};

/// Identifies a persisted row: a table (or side table) and a key.
///
/// For side tables the key is the owner's key and the row stands for every
/// side row of that owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RowRef {
    pub(crate) table: String,
    pub(crate) key: TableValue,
}

#[derive(Debug)]
pub(crate) struct TrackedRow {
    /// Column values in storage form; for side tables, the distinct values
    /// in order
    pub(crate) values: Vec<Value>,

    /// Root row of the aggregate the row belongs to
    pub(crate) root: RowRef,
}

/// Last-known persisted state of every row a session has read or written.
#[derive(Debug, Default)]
pub(crate) struct Tracked {
    rows: HashMap<RowRef, TrackedRow>,
}

impl RowRef {
    pub(crate) fn new(table: &str, key: TableValue) -> Self {
        Self {
            table: table.to_string(),
            key,
        }
    }
}

impl Tracked {
    pub(crate) fn get(&self, row: &RowRef) -> Option<&TrackedRow> {
        self.rows.get(row)
    }

    pub(crate) fn insert(&mut self, row: RowRef, values: Vec<Value>, root: RowRef) {
        self.rows.insert(row, TrackedRow { values, root });
    }

    /// Drops the rows of `root`'s aggregate that are not in `keep`.
    pub(crate) fn retain_root(&mut self, root: &RowRef, keep: &HashSet<RowRef>) {
        self.rows
            .retain(|row, tracked| &tracked.root != root || keep.contains(row));
    }

    /// Names of the tables holding rows of `root`'s aggregate that are not
    /// in `keep`.
    pub(crate) fn stale_tables(&self, root: &RowRef, keep: &HashSet<RowRef>) -> HashSet<String> {
        self.rows
            .iter()
            .filter(|(row, tracked)| &tracked.root == root && !keep.contains(*row))
            .map(|(row, _)| row.table.clone())
            .collect()
    }

    /// Drops every row of `root`'s aggregate.
    pub(crate) fn forget_root(&mut self, root: &RowRef) {
        self.rows.retain(|_, tracked| &tracked.root != root);
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
    }
}

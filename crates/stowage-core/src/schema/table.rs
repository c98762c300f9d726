use super::{ColumnBlueprint, EntityId, VariantTag};
use crate::stmt::Direction;

use serde::{Deserialize, Serialize};
use std::fmt;

/// One physical table of an aggregate.
#[derive(Debug)]
pub struct TableBlueprint {
    /// Uniquely identifies the table within its blueprint
    pub id: TableId,

    /// Name of the table, including any configured prefix
    pub name: String,

    /// The table's columns, in insert/update parameter order
    pub columns: Vec<ColumnBlueprint>,

    /// Indices into `columns` of the primary key
    pub primary_key: Vec<usize>,

    /// The table this one hangs off. `None` only for the root's main table.
    pub parent: Option<TableId>,

    /// Indices into `columns` referencing the parent table's primary key, in
    /// the parent key's column order
    pub parent_key: Vec<usize>,

    /// Sort column keeping rows in a deterministic order
    pub order_by: Option<(usize, Direction)>,

    pub join: JoinKind,

    /// For joined tables, the entity variant the table belongs to
    pub variant: Option<VariantTag>,

    /// The entity whose main or joined table this is
    pub entity: EntityId,

    pub role: TableRole,

    /// Distance from the root's main table
    pub depth: usize,
}

/// Uniquely identifies a table within a blueprint
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct TableId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    /// The entity's own table
    Main,

    /// A one-to-one extension of the entity's main table
    Joined,
}

impl TableBlueprint {
    pub fn column(&self, index: usize) -> &ColumnBlueprint {
        &self.columns[index]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn primary_key_columns(&self) -> impl ExactSizeIterator<Item = &ColumnBlueprint> + '_ {
        self.primary_key.iter().map(|index| &self.columns[*index])
    }

    pub fn parent_key_columns(&self) -> impl ExactSizeIterator<Item = &ColumnBlueprint> + '_ {
        self.parent_key.iter().map(|index| &self.columns[*index])
    }

    /// Columns that are not part of the primary key, in position order.
    pub fn non_primary_key_columns(&self) -> impl Iterator<Item = (usize, &ColumnBlueprint)> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !column.primary_key)
    }

    /// Index of the auto-increment column, if the table generates its key.
    pub fn auto_increment(&self) -> Option<usize> {
        self.columns.iter().position(|column| column.auto_increment)
    }

    pub fn is_main(&self) -> bool {
        self.role == TableRole::Main
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "TableId({})", self.0)
    }
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

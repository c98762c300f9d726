use super::TableId;
use crate::{convert::Converter, stmt::ScalarType};

use std::{fmt, sync::Arc};

#[derive(Debug, Clone)]
pub struct ColumnBlueprint {
    /// The name of the column in the database.
    pub name: String,

    /// The declared type of the values the column holds.
    pub ty: ScalarType,

    pub nullable: bool,

    /// True if the column is part of the table's primary key
    pub primary_key: bool,

    /// True if the store generates the column's value on insert
    pub auto_increment: bool,

    /// True if the column references the parent table's key
    pub parent_key: bool,

    /// Converter used instead of the registry's entry for `ty`
    pub converter: Option<Arc<dyn Converter>>,

    /// Where the engine takes the column's value from when writing a row
    pub source: ColumnSource,

    /// Position in the table; fixes insert/update parameter order
    pub position: usize,
}

/// Where a column's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// Component `component` of the values of field `field` of the owning
    /// entity
    Field { field: usize, component: usize },

    /// Component `component` of the parent row's key
    ParentKey { component: usize },

    /// The entity's position within the collection that holds it
    ListIndex,

    /// The entity's variant tag
    Discriminator,
}

#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct ColumnId {
    pub table: TableId,
    pub index: usize,
}

impl ColumnBlueprint {
    /// The field this column feeds, if any.
    pub fn field(&self) -> Option<usize> {
        match self.source {
            ColumnSource::Field { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Debug for ColumnId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ColumnId({}/{})", self.table.0, self.index)
    }
}

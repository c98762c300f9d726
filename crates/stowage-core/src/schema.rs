//! The blueprint model: an immutable description of how one aggregate maps
//! onto tables.
//!
//! Blueprints are declared with [`EntityDef`], [`TableDef`] and [`Field`],
//! and built once by [`Builder`]. The result is an arena: entities, tables
//! and side tables refer to each other by id, and parents always come before
//! their children.

mod access;
pub use access::{ChildAccess, Constructor, Instance, ValueAccess};

mod builder;
pub use builder::Builder;

mod collection;
pub use collection::{EntityCollection, ValueCollection};

mod column;
pub use column::{ColumnBlueprint, ColumnId, ColumnSource};

mod def;
pub use def::{CustomMapper, EntityDef, Field, SideTableDef, TableDef};

mod discriminator;
pub use discriminator::{
    Discriminator, DiscriminatorBlueprint, Resolve, RowView, VariantBlueprint, VariantTag,
};

mod entity;
pub use entity::{EntityBlueprint, EntityId, VersionBlueprint};

mod field;
pub use field::{FieldBlueprint, FieldKind, FieldType};

mod side;
pub use side::{SideId, SideKind, SideTableBlueprint};

mod table;
pub use table::{JoinKind, TableBlueprint, TableId, TableRole};

mod verify;

use crate::Result;

/// The complete mapping of one aggregate.
#[derive(Debug)]
pub struct Blueprint {
    /// Entity nodes in pre-order; the root is first.
    pub entities: Vec<EntityBlueprint>,

    /// Tables in pre-order; the root's main table is first.
    pub tables: Vec<TableBlueprint>,

    pub sides: Vec<SideTableBlueprint>,

    /// Whether the root's own rows are written before its children's.
    pub main_table_inserted_first: bool,
}

impl Blueprint {
    pub fn root(&self) -> &EntityBlueprint {
        &self.entities[0]
    }

    pub fn root_table(&self) -> &TableBlueprint {
        self.table(self.root().table)
    }

    pub fn entity(&self, id: EntityId) -> &EntityBlueprint {
        &self.entities[id.0]
    }

    pub fn table(&self, id: TableId) -> &TableBlueprint {
        &self.tables[id.0]
    }

    pub fn side(&self, id: SideId) -> &SideTableBlueprint {
        &self.sides[id.0]
    }

    pub fn table_by_name(&self, name: &str) -> Option<&TableBlueprint> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// The tables above `id`, nearest first, ending with the root's main
    /// table.
    pub fn ancestors(&self, id: TableId) -> impl Iterator<Item = &TableBlueprint> + '_ {
        let mut next = self.table(id).parent;
        std::iter::from_fn(move || {
            let table = self.table(next?);
            next = table.parent;
            Some(table)
        })
    }
}

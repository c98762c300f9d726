use super::{
    Constructor, DiscriminatorBlueprint, FieldBlueprint, Instance, SideId, TableId, VariantTag,
};
use crate::{err, Result};

use std::fmt;

/// One node of the aggregate tree.
pub struct EntityBlueprint {
    pub id: EntityId,

    /// Display name, used in logs and errors
    pub name: String,

    /// Owning entity and the index of the field holding this one
    pub parent: Option<(EntityId, usize)>,

    pub fields: Vec<FieldBlueprint>,

    /// The entity's own table
    pub table: TableId,

    /// One-to-one tables extending the main table
    pub joined: Vec<TableId>,

    /// Indices into `fields`; empty when identity derives from the parent key
    pub primary_key: Vec<usize>,

    pub discriminator: Option<DiscriminatorBlueprint>,

    pub version: Option<VersionBlueprint>,

    /// Child entity nodes, in field order
    pub children: Vec<EntityId>,

    /// Side tables of this entity's collection fields
    pub sides: Vec<SideId>,

    pub(crate) construct: Option<Constructor>,
}

/// Uniquely identifies an entity node within a blueprint
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct EntityId(pub usize);

/// Optimistic concurrency column of an entity's main table.
#[derive(Debug, Clone, Copy)]
pub struct VersionBlueprint {
    pub field: usize,
    pub column: usize,
}

impl EntityBlueprint {
    /// The main table followed by the joined tables.
    pub fn tables(&self) -> impl Iterator<Item = TableId> + '_ {
        std::iter::once(self.table).chain(self.joined.iter().copied())
    }

    pub fn field(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Builds an empty instance. Polymorphic entities are built through their
    /// variant instead.
    pub fn construct(&self) -> Result<Box<Instance>> {
        match &self.construct {
            Some(construct) => Ok(construct()),
            None => Err(err!("entity `{}` is polymorphic and needs a variant", self.name)),
        }
    }

    /// The variant `instance` currently is, for polymorphic entities.
    pub fn variant_of(&self, instance: &Instance) -> Result<Option<VariantTag>> {
        self.discriminator
            .as_ref()
            .map(|discriminator| discriminator.tag_of(instance))
            .transpose()
    }
}

impl fmt::Debug for EntityBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityBlueprint")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("fields", &self.fields)
            .field("table", &self.table)
            .field("joined", &self.joined)
            .field("primary_key", &self.primary_key)
            .field("discriminator", &self.discriminator)
            .field("version", &self.version)
            .field("children", &self.children)
            .field("sides", &self.sides)
            .finish()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "EntityId({})", self.0)
    }
}

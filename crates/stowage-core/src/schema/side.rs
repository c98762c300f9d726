use super::{EntityId, TableId};
use crate::{convert::Converter, stmt::ScalarType};

use std::{fmt, sync::Arc};

/// Side table backing a [`ForeignKeyList`](super::FieldType::ForeignKeyList)
/// or [`FlattenedCollection`](super::FieldType::FlattenedCollection) field.
///
/// Each row pairs the owner's key with one value of the collection.
#[derive(Debug)]
pub struct SideTableBlueprint {
    pub id: SideId,

    pub name: String,

    /// Column holding the owner's key
    pub key_column: String,

    /// Column holding the collection value
    pub join_column: String,

    /// Column holding the value's position, when order is preserved
    pub order_column: Option<String>,

    /// Main table of the owning entity
    pub owner: TableId,

    pub entity: EntityId,

    /// Index of the owning field within the entity
    pub field: usize,

    pub kind: SideKind,

    /// Type of the collection values
    pub value_ty: ScalarType,

    /// Type of the owner key stored in `key_column`
    pub key_ty: ScalarType,

    /// Converter of the owner key column, if it overrides the registry
    pub key_converter: Option<Arc<dyn Converter>>,

    pub depth: usize,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct SideId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideKind {
    /// Keys of another aggregate
    ForeignKeyList,

    /// Scalar values owned by the entity
    Flattened,
}

impl fmt::Debug for SideId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "SideId({})", self.0)
    }
}

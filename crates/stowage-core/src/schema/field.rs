use super::{ChildAccess, EntityId, SideId, TableId, ValueAccess, VariantTag};

use std::{fmt, sync::Arc};

/// One named field of an entity.
#[derive(Debug)]
pub struct FieldBlueprint {
    pub name: String,

    pub ty: FieldType,

    /// Only present on this variant of a polymorphic entity
    pub variant: Option<VariantTag>,

    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Primitive,
    Entity,
    EntityList,
    ForeignKeyList,
    FlattenedCollection,
    CustomValueMapper,
    CompoundCustomValueMapper,
}

pub enum FieldKind {
    /// The field is stored in one or more columns of `table`.
    Columns {
        table: TableId,
        columns: Vec<usize>,
        access: ValueAccess,

        /// Values pass through the converter registry. False for custom
        /// mappers, which exchange storage values directly.
        converted: bool,
    },

    /// The field holds owned child entities.
    Child {
        entity: EntityId,
        access: Arc<dyn ChildAccess>,
    },

    /// The field's values live in a side table.
    Side { side: SideId, access: ValueAccess },
}

impl FieldBlueprint {
    /// True if the field is present on an entity of variant `tag`.
    pub fn applies_to(&self, tag: Option<&VariantTag>) -> bool {
        match (&self.variant, tag) {
            (None, _) => true,
            (Some(variant), Some(tag)) => variant == tag,
            (Some(_), None) => false,
        }
    }

    /// Scalar fields every variant carries can be part of a primary key.
    pub fn is_key_candidate(&self) -> bool {
        self.variant.is_none()
            && matches!(
                self.ty,
                FieldType::Primitive
                    | FieldType::CustomValueMapper
                    | FieldType::CompoundCustomValueMapper
            )
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Columns {
                table,
                columns,
                converted,
                ..
            } => f
                .debug_struct("Columns")
                .field("table", table)
                .field("columns", columns)
                .field("converted", converted)
                .finish(),
            FieldKind::Child { entity, .. } => {
                f.debug_struct("Child").field("entity", entity).finish()
            }
            FieldKind::Side { side, .. } => f.debug_struct("Side").field("side", side).finish(),
        }
    }
}

use super::{
    access::Children, discriminator::DiscriminatorParts, ChildAccess, Constructor, Discriminator,
    EntityCollection, Instance, JoinKind, SideKind, ValueAccess, ValueCollection, VariantTag,
};
use crate::{
    convert::Converter,
    stmt::{Direction, Scalar, ScalarType, Value},
    Result,
};

use std::{marker::PhantomData, sync::Arc};

/// Declares one physical table.
#[derive(Debug, Clone)]
pub struct TableDef {
    pub(crate) name: String,
    pub(crate) primary_key: Vec<String>,
    pub(crate) auto_increment: Option<String>,
    pub(crate) parent: Option<String>,
    pub(crate) parent_key: Vec<String>,
    pub(crate) order_by: Option<(String, Direction)>,
    pub(crate) list_index: Option<String>,
    pub(crate) join: Option<JoinKind>,
    pub(crate) variant: Option<VariantTag>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: vec![],
            auto_increment: None,
            parent: None,
            parent_key: vec![],
            order_by: None,
            list_index: None,
            join: None,
            variant: None,
        }
    }

    /// Key columns of a table whose entity declares no primary-key fields.
    /// They must be parent-key or list-index columns.
    pub fn primary_key<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// The store generates `column` on insert.
    pub fn auto_increment(mut self, column: impl Into<String>) -> Self {
        self.auto_increment = Some(column.into());
        self
    }

    /// Hangs the table off `table` instead of the owning entity's main table.
    pub fn parent(mut self, table: impl Into<String>) -> Self {
        self.parent = Some(table.into());
        self
    }

    /// Columns referencing the parent table's primary key.
    pub fn parent_key<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.parent_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((column.into(), direction));
        self
    }

    /// Stores each entity's position within its collection in `column` and
    /// orders by it unless another order is declared.
    pub fn list_index(mut self, column: impl Into<String>) -> Self {
        self.list_index = Some(column.into());
        self
    }

    pub fn join(mut self, join: JoinKind) -> Self {
        self.join = Some(join);
        self
    }

    /// Restricts a joined table to one variant of a polymorphic entity.
    /// Such tables are left-joined unless declared otherwise.
    pub fn variant(mut self, tag: impl Into<VariantTag>) -> Self {
        self.variant = Some(tag.into());
        self
    }
}

/// Declares the side table of a foreign-key list or flattened collection.
#[derive(Debug, Clone)]
pub struct SideTableDef {
    pub(crate) table: String,
    pub(crate) key_column: String,
    pub(crate) join_column: String,
    pub(crate) order_column: Option<String>,
}

impl SideTableDef {
    /// `key_column` holds the owner's key, `join_column` one value.
    pub fn new(
        table: impl Into<String>,
        key_column: impl Into<String>,
        join_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            key_column: key_column.into(),
            join_column: join_column.into(),
            order_column: None,
        }
    }

    /// Persists the collection order in `column`.
    pub fn order_column(mut self, column: impl Into<String>) -> Self {
        self.order_column = Some(column.into());
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ColumnDecl {
    pub(crate) name: String,
    pub(crate) ty: ScalarType,
    pub(crate) nullable: bool,
    pub(crate) converter: Option<Arc<dyn Converter>>,
}

impl ColumnDecl {
    fn new(name: impl Into<String>, ty: ScalarType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable,
            converter: None,
        }
    }
}

/// Maps a field to one or more columns with hand-written conversions.
///
/// The closures exchange storage values; the converter registry is not
/// consulted.
pub struct CustomMapper<T> {
    pub(crate) columns: Vec<ColumnDecl>,
    pub(crate) access: ValueAccess,
    pub(crate) compound: bool,
    _p: PhantomData<fn(T)>,
}

impl<T: Send + Sync + 'static> CustomMapper<T> {
    pub fn single<G, S>(column: impl Into<String>, ty: ScalarType, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
        S: Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            columns: vec![ColumnDecl::new(column, ty, true)],
            access: ValueAccess::new(
                move |owner: &T| Ok(vec![get(owner)]),
                move |owner: &mut T, values: Vec<Value>| {
                    set(owner, values.into_iter().next().unwrap_or_default())
                },
            ),
            compound: false,
            _p: PhantomData,
        }
    }

    /// A value spread over several columns, exchanged in column order.
    pub fn compound<I, N, G, S>(columns: I, get: G, set: S) -> Self
    where
        I: IntoIterator<Item = (N, ScalarType)>,
        N: Into<String>,
        G: Fn(&T) -> Vec<Value> + Send + Sync + 'static,
        S: Fn(&mut T, Vec<Value>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, ty)| ColumnDecl::new(name, ty, true))
                .collect(),
            access: ValueAccess::new(move |owner: &T| Ok(get(owner)), set),
            compound: true,
            _p: PhantomData,
        }
    }
}

/// Declares one field of an entity.
pub struct Field<T> {
    pub(crate) raw: RawField,
    _p: PhantomData<fn(T)>,
}

pub(crate) struct RawField {
    pub(crate) name: String,
    pub(crate) table: Option<String>,
    pub(crate) variant: Option<VariantTag>,
    pub(crate) structural: Option<Structural>,
    pub(crate) custom: Option<RawCustom>,
}

pub(crate) enum Structural {
    Primitive {
        column: ColumnDecl,
        access: ValueAccess,
    },
    Child {
        entity: Box<RawEntityDef>,
        access: Arc<dyn ChildAccess>,
        singular: bool,
    },
    Side {
        side: SideTableDef,
        access: ValueAccess,
        value_ty: ScalarType,
        kind: SideKind,
    },
}

pub(crate) struct RawCustom {
    pub(crate) columns: Vec<ColumnDecl>,
    pub(crate) access: ValueAccess,
    pub(crate) compound: bool,
}

impl<T: Send + Sync + 'static> Field<T> {
    /// A field with no mapping yet; one must be added before registration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            raw: RawField {
                name: name.into(),
                table: None,
                variant: None,
                structural: None,
                custom: None,
            },
            _p: PhantomData,
        }
    }

    /// A scalar stored in a single column.
    pub fn primitive<S, G, M>(
        name: impl Into<String>,
        column: impl Into<String>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        S: Scalar,
        G: Fn(&T) -> &S + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut S + Send + Sync + 'static,
    {
        let access = ValueAccess::new(
            move |owner: &T| Ok(vec![get(owner).to_value()]),
            move |owner: &mut T, values: Vec<Value>| {
                *get_mut(owner) = S::from_value(values.into_iter().next().unwrap_or_default())?;
                Ok(())
            },
        );

        Self::new(name).with_structural(Structural::Primitive {
            column: ColumnDecl::new(column, S::TYPE, S::NULLABLE),
            access,
        })
    }

    /// A scalar that only some variants of an enum carry. Reads as null on
    /// other variants; writes to other variants are ignored.
    pub fn variant_primitive<S, G, M>(
        name: impl Into<String>,
        column: impl Into<String>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        S: Scalar,
        G: Fn(&T) -> Option<&S> + Send + Sync + 'static,
        M: Fn(&mut T) -> Option<&mut S> + Send + Sync + 'static,
    {
        let access = ValueAccess::new(
            move |owner: &T| Ok(vec![get(owner).map(S::to_value).unwrap_or_default()]),
            move |owner: &mut T, values: Vec<Value>| {
                if let Some(slot) = get_mut(owner) {
                    *slot = S::from_value(values.into_iter().next().unwrap_or_default())?;
                }
                Ok(())
            },
        );

        Self::new(name).with_structural(Structural::Primitive {
            column: ColumnDecl::new(column, S::TYPE, true),
            access,
        })
    }

    /// Owned children held in any [`EntityCollection`].
    pub fn child<C, L, G, M>(
        name: impl Into<String>,
        child: EntityDef<C>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        C: Send + Sync + 'static,
        L: EntityCollection<C>,
        G: Fn(&T) -> &L + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut L + Send + Sync + 'static,
    {
        let access: Arc<dyn ChildAccess> = Arc::new(Children::<T, C, L, G, M>::new(get, get_mut));

        Self::new(name).with_structural(Structural::Child {
            entity: Box::new(child.raw),
            access,
            singular: L::SINGULAR,
        })
    }

    /// At most one owned child.
    pub fn entity<C, G, M>(
        name: impl Into<String>,
        child: EntityDef<C>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        C: Send + Sync + 'static,
        G: Fn(&T) -> &Option<C> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<C> + Send + Sync + 'static,
    {
        Self::child(name, child, get, get_mut)
    }

    /// An ordered list of owned children.
    pub fn entity_list<C, G, M>(
        name: impl Into<String>,
        child: EntityDef<C>,
        get: G,
        get_mut: M,
    ) -> Self
    where
        C: Send + Sync + 'static,
        G: Fn(&T) -> &Vec<C> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Vec<C> + Send + Sync + 'static,
    {
        Self::child(name, child, get, get_mut)
    }

    /// Keys of another aggregate, stored in a join table.
    pub fn foreign_key_list<K, L, G, M>(
        name: impl Into<String>,
        side: SideTableDef,
        get: G,
        get_mut: M,
    ) -> Self
    where
        K: Scalar,
        L: ValueCollection<K>,
        G: Fn(&T) -> &L + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut L + Send + Sync + 'static,
    {
        Self::side::<K, L, G, M>(name, side, SideKind::ForeignKeyList, get, get_mut)
    }

    /// Scalar values stored one per row in a side table.
    pub fn flattened<K, L, G, M>(
        name: impl Into<String>,
        side: SideTableDef,
        get: G,
        get_mut: M,
    ) -> Self
    where
        K: Scalar,
        L: ValueCollection<K>,
        G: Fn(&T) -> &L + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut L + Send + Sync + 'static,
    {
        Self::side::<K, L, G, M>(name, side, SideKind::Flattened, get, get_mut)
    }

    fn side<K, L, G, M>(
        name: impl Into<String>,
        side: SideTableDef,
        kind: SideKind,
        get: G,
        get_mut: M,
    ) -> Self
    where
        K: Scalar,
        L: ValueCollection<K>,
        G: Fn(&T) -> &L + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut L + Send + Sync + 'static,
    {
        let access = ValueAccess::new(
            move |owner: &T| Ok(get(owner).values().into_iter().map(K::to_value).collect()),
            move |owner: &mut T, values: Vec<Value>| {
                let values = values
                    .into_iter()
                    .map(K::from_value)
                    .collect::<Result<Vec<_>>>()?;
                *get_mut(owner) = L::from_values(values);
                Ok(())
            },
        );

        Self::new(name).with_structural(Structural::Side {
            side,
            access,
            value_ty: K::TYPE,
            kind,
        })
    }

    /// A field mapped entirely by `mapper`.
    pub fn custom_mapped(name: impl Into<String>, mapper: CustomMapper<T>) -> Self {
        Self::new(name).custom(mapper)
    }

    /// Adds a custom mapping to the field.
    pub fn custom(mut self, mapper: CustomMapper<T>) -> Self {
        self.raw.custom = Some(RawCustom {
            columns: mapper.columns,
            access: mapper.access,
            compound: mapper.compound,
        });
        self
    }

    /// Stores the field's column(s) in a joined table of the entity.
    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        self.raw.table = Some(table.into());
        self
    }

    /// Only maps the field for one variant of a polymorphic entity.
    pub fn variant(mut self, tag: impl Into<VariantTag>) -> Self {
        self.raw.variant = Some(tag.into());
        self
    }

    /// Overrides the registry's converter for a primitive field's column.
    pub fn converter(mut self, converter: impl Converter) -> Self {
        if let Some(Structural::Primitive { column, .. }) = &mut self.raw.structural {
            column.converter = Some(Arc::new(converter));
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.raw.name
    }

    fn with_structural(mut self, structural: Structural) -> Self {
        self.raw.structural = Some(structural);
        self
    }
}

/// Declares one entity of an aggregate: its tables, fields and identity.
pub struct EntityDef<T> {
    pub(crate) raw: RawEntityDef,
    _p: PhantomData<fn(T)>,
}

pub(crate) struct RawEntityDef {
    pub(crate) name: String,
    pub(crate) table: TableDef,
    pub(crate) joined: Vec<TableDef>,
    pub(crate) fields: Vec<RawField>,
    pub(crate) primary_key: Vec<String>,
    pub(crate) discriminator: Option<DiscriminatorParts>,
    pub(crate) version: Option<String>,
    pub(crate) construct: Option<Constructor>,
    pub(crate) main_table_inserted_first: bool,
}

impl<T: Send + Sync + 'static> EntityDef<T> {
    pub fn new(table: TableDef) -> Self
    where
        T: Default,
    {
        Self::with_constructor(table, T::default)
    }

    pub fn with_constructor(
        table: TableDef,
        construct: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let construct: Constructor = Arc::new(move || -> Box<Instance> { Box::new(construct()) });
        Self::from_parts(table, Some(construct), None)
    }

    /// An entity whose concrete variant is chosen per row.
    pub fn polymorphic(table: TableDef, discriminator: Discriminator<T>) -> Self {
        Self::from_parts(table, None, Some(discriminator.parts))
    }

    fn from_parts(
        table: TableDef,
        construct: Option<Constructor>,
        discriminator: Option<DiscriminatorParts>,
    ) -> Self {
        let name = std::any::type_name::<T>();
        let name = name.rsplit("::").next().unwrap_or(name);

        Self {
            raw: RawEntityDef {
                name: name.to_string(),
                table,
                joined: vec![],
                fields: vec![],
                primary_key: vec![],
                discriminator,
                version: None,
                construct,
                main_table_inserted_first: true,
            },
            _p: PhantomData,
        }
    }

    /// Overrides the display name used in logs and errors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.raw.name = name.into();
        self
    }

    /// Names the fields forming the entity's identity.
    pub fn primary_key<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.raw.primary_key = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn field(mut self, field: Field<T>) -> Self {
        self.raw.fields.push(field.raw);
        self
    }

    /// Adds a one-to-one table keyed by the main table's key.
    pub fn joined(mut self, table: TableDef) -> Self {
        self.raw.joined.push(table);
        self
    }

    /// Uses the integer field `field` for optimistic concurrency checks.
    pub fn version(mut self, field: impl Into<String>) -> Self {
        self.raw.version = Some(field.into());
        self
    }

    /// Whether the root's own tables are written before (the default) or
    /// after its children. Only meaningful on the root entity.
    pub fn main_table_inserted_first(mut self, first: bool) -> Self {
        self.raw.main_table_inserted_first = first;
        self
    }
}

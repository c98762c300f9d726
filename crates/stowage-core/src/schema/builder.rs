use super::{
    def::{ColumnDecl, RawCustom, RawEntityDef, RawField, Structural, TableDef},
    discriminator::{DiscriminatorSource, Resolve},
    Blueprint, ColumnBlueprint, ColumnSource, DiscriminatorBlueprint, EntityBlueprint, EntityDef,
    EntityId, FieldBlueprint, FieldKind, FieldType, JoinKind, SideId, SideKind, SideTableBlueprint,
    TableBlueprint, TableId, TableRole, VersionBlueprint,
};
use crate::{stmt::ScalarType, Error, Result};

#[derive(Debug, Default)]
pub struct Builder {
    /// If set, prefix all table names with this string
    table_name_prefix: Option<String>,
}

/// Used to track state during the build process
struct BuildBlueprint<'a> {
    /// Build options
    builder: &'a Builder,

    entities: Vec<EntityBlueprint>,

    /// Tables as they are built. Parents always precede their children.
    tables: Vec<TableBlueprint>,

    sides: Vec<SideTableBlueprint>,

    /// Parent references resolved once every table exists
    parents: Vec<PendingParent>,
}

struct PendingParent {
    table: TableId,

    /// Declared parent table name, already prefixed
    declared: Option<String>,

    /// Parent used when none is declared
    default: TableId,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn build<T>(&self, def: EntityDef<T>) -> Result<Blueprint> {
        let main_table_inserted_first = def.raw.main_table_inserted_first;

        let mut build = BuildBlueprint {
            builder: self,
            entities: vec![],
            tables: vec![],
            sides: vec![],
            parents: vec![],
        };

        build.build_entity(def.raw, None)?;
        build.resolve_parents()?;

        let blueprint = Blueprint {
            entities: build.entities,
            tables: build.tables,
            sides: build.sides,
            main_table_inserted_first,
        };

        blueprint.verify()?;

        Ok(blueprint)
    }

    fn table_name(&self, name: &str) -> String {
        match &self.table_name_prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_string(),
        }
    }
}

impl BuildBlueprint<'_> {
    fn build_entity(
        &mut self,
        def: RawEntityDef,
        parent: Option<(EntityId, usize)>,
    ) -> Result<EntityId> {
        let RawEntityDef {
            name,
            table: table_def,
            joined: joined_defs,
            fields: field_defs,
            primary_key,
            discriminator,
            version,
            construct,
            main_table_inserted_first: _,
        } = def;

        let id = EntityId(self.entities.len());
        let main = self.push_table(&table_def, id, TableRole::Main);
        let joined: Vec<_> = joined_defs
            .iter()
            .map(|joined_def| self.push_table(joined_def, id, TableRole::Joined))
            .collect();

        self.entities.push(EntityBlueprint {
            id,
            name: name.clone(),
            parent,
            fields: vec![],
            table: main,
            joined: joined.clone(),
            primary_key: vec![],
            discriminator: None,
            version: None,
            children: vec![],
            sides: vec![],
            construct,
        });

        match parent {
            Some((owner, _)) => {
                for (component, column) in table_def.parent_key.iter().enumerate() {
                    let index = self.push_column(
                        main,
                        column,
                        ScalarType::I64,
                        false,
                        ColumnSource::ParentKey { component },
                    );
                    self.tables[main.0].parent_key.push(index);
                }

                let owner_main = self.entities[owner.0].table;
                self.parents.push(PendingParent {
                    table: main,
                    declared: table_def.parent.as_deref().map(|name| self.builder.table_name(name)),
                    default: owner_main,
                });
            }
            None => {
                if !table_def.parent_key.is_empty() || table_def.parent.is_some() {
                    return Err(Error::invalid_blueprint(format!(
                        "root table `{}` cannot declare a parent",
                        table_def.name
                    )));
                }
            }
        }

        if let Some(column) = &table_def.list_index {
            if parent.is_none() {
                return Err(Error::invalid_blueprint(format!(
                    "root table `{}` cannot declare a list index",
                    table_def.name
                )));
            }
            self.push_column(main, column, ScalarType::I64, false, ColumnSource::ListIndex);
        }

        if let Some(DiscriminatorSource::Column(column)) =
            discriminator.as_ref().map(|d| &d.source)
        {
            self.push_column(main, column, ScalarType::String, false, ColumnSource::Discriminator);
        }

        let mut fields = Vec::with_capacity(field_defs.len());
        let mut children = vec![];
        let mut sides = vec![];

        for (index, field_def) in field_defs.into_iter().enumerate() {
            let field = self.build_field(id, &name, main, &joined, index, field_def)?;

            match &field.kind {
                FieldKind::Child { entity, .. } => children.push(*entity),
                FieldKind::Side { side, .. } => sides.push(*side),
                FieldKind::Columns { .. } => {}
            }

            fields.push(field);
        }

        // Primary key of the main table
        let pk_columns = if !primary_key.is_empty() {
            if !table_def.primary_key.is_empty() {
                return Err(Error::invalid_blueprint(format!(
                    "entity `{name}` declares both primary-key fields and primary-key columns on `{}`",
                    table_def.name
                )));
            }

            let mut columns = vec![];
            let mut pk_fields = vec![];

            for field_name in &primary_key {
                let Some(index) = fields.iter().position(|field| &field.name == field_name) else {
                    return Err(Error::invalid_blueprint(format!(
                        "primary-key field `{field_name}` names no field of `{name}`"
                    )));
                };

                match &fields[index].kind {
                    FieldKind::Columns { table, columns: field_columns, .. }
                        if *table == main && fields[index].is_key_candidate() =>
                    {
                        columns.extend(field_columns.iter().copied());
                    }
                    _ => {
                        return Err(Error::invalid_blueprint(format!(
                            "primary-key field `{field_name}` of `{name}` must be a scalar of every variant mapped to `{}`",
                            table_def.name
                        )))
                    }
                }

                pk_fields.push(index);
            }

            self.entities[id.0].primary_key = pk_fields;
            columns
        } else if !table_def.primary_key.is_empty() {
            self.column_indices(main, &table_def.primary_key)?
        } else {
            let table = &self.tables[main.0];
            let mut columns = table.parent_key.clone();
            columns.extend(
                table
                    .columns
                    .iter()
                    .position(|column| column.source == ColumnSource::ListIndex),
            );
            columns
        };

        self.set_primary_key(main, pk_columns);
        self.apply_table_options(main, &table_def)?;

        // Joined tables are keyed by the main table's key
        for (joined_id, joined_def) in joined.iter().zip(&joined_defs) {
            let fk_names = if joined_def.parent_key.is_empty() {
                self.tables[main.0]
                    .primary_key_columns()
                    .map(|column| column.name.clone())
                    .collect()
            } else {
                joined_def.parent_key.clone()
            };

            for (component, column) in fk_names.iter().enumerate() {
                let index = self.push_column(
                    *joined_id,
                    column,
                    ScalarType::I64,
                    false,
                    ColumnSource::ParentKey { component },
                );
                self.tables[joined_id.0].parent_key.push(index);
            }

            let pk_columns = if joined_def.primary_key.is_empty() {
                self.tables[joined_id.0].parent_key.clone()
            } else {
                self.column_indices(*joined_id, &joined_def.primary_key)?
            };

            self.set_primary_key(*joined_id, pk_columns);
            self.apply_table_options(*joined_id, joined_def)?;

            self.parents.push(PendingParent {
                table: *joined_id,
                declared: None,
                default: main,
            });
        }

        let version = match version {
            Some(field_name) => {
                let Some(field) = fields.iter().position(|field| field.name == field_name) else {
                    return Err(Error::invalid_blueprint(format!(
                        "version field `{field_name}` names no field of `{name}`"
                    )));
                };

                match &fields[field].kind {
                    FieldKind::Columns { table, columns, .. }
                        if fields[field].ty == FieldType::Primitive
                            && *table == main
                            && self.tables[main.0].columns[columns[0]].ty.is_integer()
                            && !self.tables[main.0].columns[columns[0]].nullable =>
                    {
                        Some(VersionBlueprint {
                            field,
                            column: columns[0],
                        })
                    }
                    _ => {
                        return Err(Error::invalid_blueprint(format!(
                            "version field `{field_name}` of `{name}` must be a non-nullable integer primitive in the main table"
                        )))
                    }
                }
            }
            None => None,
        };

        let discriminator = match discriminator {
            Some(parts) => {
                if parts.variants.is_empty() {
                    return Err(Error::invalid_blueprint(format!(
                        "discriminator of `{name}` declares no variants"
                    )));
                }

                let resolve = match parts.source {
                    DiscriminatorSource::Column(column) => Resolve::Column(column),
                    DiscriminatorSource::JoinedTable => Resolve::JoinedTables(
                        joined
                            .iter()
                            .filter_map(|table| {
                                let table = &self.tables[table.0];
                                table.variant.clone().map(|tag| (tag, table.name.clone()))
                            })
                            .collect(),
                    ),
                    DiscriminatorSource::Custom(resolve) => Resolve::Custom(resolve),
                };

                Some(DiscriminatorBlueprint::new(resolve, parts.variants, parts.tag_of))
            }
            None => None,
        };

        let entity = &mut self.entities[id.0];
        entity.fields = fields;
        entity.children = children;
        entity.sides = sides;
        entity.version = version;
        entity.discriminator = discriminator;

        Ok(id)
    }

    fn build_field(
        &mut self,
        entity: EntityId,
        entity_name: &str,
        main: TableId,
        joined: &[TableId],
        index: usize,
        def: RawField,
    ) -> Result<FieldBlueprint> {
        let RawField {
            name,
            table,
            variant,
            structural,
            custom,
        } = def;

        let target = match &table {
            None => main,
            Some(table_name) => {
                let table_name = self.builder.table_name(table_name);
                match joined.iter().find(|id| self.tables[id.0].name == table_name) {
                    Some(id) => *id,
                    None => {
                        return Err(Error::invalid_blueprint(format!(
                            "field `{name}` of `{entity_name}` is stored in `{table_name}`, which is not a table of the entity"
                        )))
                    }
                }
            }
        };

        let (ty, kind) = match (structural, custom) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid_blueprint(format!(
                    "field `{name}` of `{entity_name}` cannot be both a custom mapper and a structural field"
                )))
            }
            (None, None) => {
                return Err(Error::invalid_blueprint(format!(
                    "field `{name}` of `{entity_name}` has neither a structural mapping nor a custom mapper"
                )))
            }
            (None, Some(RawCustom { columns, access, compound })) => {
                let columns = self.push_field_columns(target, index, columns);
                let ty = if compound {
                    FieldType::CompoundCustomValueMapper
                } else {
                    FieldType::CustomValueMapper
                };

                (
                    ty,
                    FieldKind::Columns {
                        table: target,
                        columns,
                        access,
                        converted: false,
                    },
                )
            }
            (Some(Structural::Primitive { column, access }), None) => {
                let columns = self.push_field_columns(target, index, vec![column]);

                (
                    FieldType::Primitive,
                    FieldKind::Columns {
                        table: target,
                        columns,
                        access,
                        converted: true,
                    },
                )
            }
            (Some(Structural::Child { entity: child, access, singular }), None) => {
                if table.is_some() {
                    return Err(Error::invalid_blueprint(format!(
                        "entity field `{name}` of `{entity_name}` cannot be stored in a joined table"
                    )));
                }

                let child = self.build_entity(*child, Some((entity, index)))?;
                let ty = if singular {
                    FieldType::Entity
                } else {
                    FieldType::EntityList
                };

                (ty, FieldKind::Child { entity: child, access })
            }
            (Some(Structural::Side { side, access, value_ty, kind }), None) => {
                for (what, value) in [
                    ("foreign table", &side.table),
                    ("key column", &side.key_column),
                    ("join column", &side.join_column),
                ] {
                    if value.trim().is_empty() {
                        return Err(Error::invalid_blueprint(format!(
                            "collection field `{name}` of `{entity_name}` has a blank {what}"
                        )));
                    }
                }

                if table.is_some() {
                    return Err(Error::invalid_blueprint(format!(
                        "collection field `{name}` of `{entity_name}` cannot be stored in a joined table"
                    )));
                }

                let id = SideId(self.sides.len());
                self.sides.push(SideTableBlueprint {
                    id,
                    name: self.builder.table_name(&side.table),
                    key_column: side.key_column,
                    join_column: side.join_column,
                    order_column: side.order_column,
                    owner: main,
                    entity,
                    field: index,
                    kind,
                    value_ty,
                    key_ty: ScalarType::I64,
                    key_converter: None,
                    depth: 0,
                });

                let ty = match kind {
                    SideKind::ForeignKeyList => FieldType::ForeignKeyList,
                    SideKind::Flattened => FieldType::FlattenedCollection,
                };

                (ty, FieldKind::Side { side: id, access })
            }
        };

        Ok(FieldBlueprint {
            name,
            ty,
            variant,
            kind,
        })
    }

    fn push_table(&mut self, def: &TableDef, entity: EntityId, role: TableRole) -> TableId {
        let id = TableId(self.tables.len());
        let join = def.join.unwrap_or(if def.variant.is_some() {
            JoinKind::Left
        } else {
            JoinKind::Inner
        });

        self.tables.push(TableBlueprint {
            id,
            name: self.builder.table_name(&def.name),
            columns: vec![],
            primary_key: vec![],
            parent: None,
            parent_key: vec![],
            order_by: None,
            join,
            variant: def.variant.clone(),
            entity,
            role,
            depth: 0,
        });

        id
    }

    fn push_column(
        &mut self,
        table: TableId,
        name: &str,
        ty: ScalarType,
        nullable: bool,
        source: ColumnSource,
    ) -> usize {
        let columns = &mut self.tables[table.0].columns;
        let position = columns.len();

        columns.push(ColumnBlueprint {
            name: name.to_string(),
            ty,
            nullable,
            primary_key: false,
            auto_increment: false,
            parent_key: matches!(source, ColumnSource::ParentKey { .. }),
            converter: None,
            source,
            position,
        });

        position
    }

    fn push_field_columns(
        &mut self,
        table: TableId,
        field: usize,
        decls: Vec<ColumnDecl>,
    ) -> Vec<usize> {
        decls
            .into_iter()
            .enumerate()
            .map(|(component, decl)| {
                let index = self.push_column(
                    table,
                    &decl.name,
                    decl.ty,
                    decl.nullable,
                    ColumnSource::Field { field, component },
                );
                self.tables[table.0].columns[index].converter = decl.converter;
                index
            })
            .collect()
    }

    fn column_indices(&self, table: TableId, names: &[String]) -> Result<Vec<usize>> {
        let table = &self.tables[table.0];

        names
            .iter()
            .map(|name| {
                table.column_index(name).ok_or_else(|| {
                    Error::invalid_blueprint(format!("`{name}` is not a column of `{}`", table.name))
                })
            })
            .collect()
    }

    fn set_primary_key(&mut self, table: TableId, columns: Vec<usize>) {
        let table = &mut self.tables[table.0];

        for index in &columns {
            table.columns[*index].primary_key = true;
            table.columns[*index].nullable = false;
        }

        table.primary_key = columns;
    }

    fn apply_table_options(&mut self, table: TableId, def: &TableDef) -> Result<()> {
        if let Some(column) = &def.auto_increment {
            let index = self.column_indices(table, std::slice::from_ref(column))?[0];
            self.tables[table.0].columns[index].auto_increment = true;
        }

        let order_by = match (&def.order_by, &def.list_index) {
            (Some((column, direction)), _) => Some((column, *direction)),
            (None, Some(column)) => Some((column, Default::default())),
            (None, None) => None,
        };

        if let Some((column, direction)) = order_by {
            let index = self.column_indices(table, std::slice::from_ref(column))?[0];
            self.tables[table.0].order_by = Some((index, direction));
        }

        Ok(())
    }

    /// Second pass: link every table to its parent, then propagate depths
    /// and parent-key column types down the tree.
    fn resolve_parents(&mut self) -> Result<()> {
        for pending in std::mem::take(&mut self.parents) {
            let parent = match &pending.declared {
                None => pending.default,
                Some(name) => self.resolve_declared_parent(pending.table, name, pending.default)?,
            };

            self.tables[pending.table.0].parent = Some(parent);
        }

        for index in 0..self.tables.len() {
            let Some(parent) = self.tables[index].parent else {
                continue;
            };

            let (parent_name, parent_depth, parent_key) = {
                let parent = &self.tables[parent.0];
                let key: Vec<_> = parent
                    .primary_key_columns()
                    .map(|column| (column.ty, column.converter.clone()))
                    .collect();
                (parent.name.clone(), parent.depth, key)
            };

            let table = &mut self.tables[index];

            if table.parent_key.len() != parent_key.len() {
                return Err(Error::invalid_blueprint(format!(
                    "table `{}` has {} parent-key column(s) but its parent `{}` has a {}-column key",
                    table.name,
                    table.parent_key.len(),
                    parent_name,
                    parent_key.len()
                )));
            }

            table.depth = parent_depth + 1;

            for (column, (ty, converter)) in table.parent_key.clone().into_iter().zip(parent_key) {
                table.columns[column].ty = ty;
                table.columns[column].converter = converter;
            }
        }

        for side in &mut self.sides {
            let owner = &self.tables[side.owner.0];

            let [key] = &owner.primary_key[..] else {
                return Err(Error::invalid_blueprint(format!(
                    "side table `{}` needs a single-column owner key but `{}` has {} key columns",
                    side.name,
                    owner.name,
                    owner.primary_key.len()
                )));
            };

            side.depth = owner.depth + 1;
            side.key_ty = owner.columns[*key].ty;
            side.key_converter = owner.columns[*key].converter.clone();
        }

        Ok(())
    }

    fn resolve_declared_parent(
        &self,
        table: TableId,
        name: &str,
        default: TableId,
    ) -> Result<TableId> {
        let child = &self.tables[table.0];
        let owner = self.tables[default.0].entity;

        // Every table of every ancestor entity is a candidate
        let mut ancestor = Some(owner);
        while let Some(entity) = ancestor {
            let entity = &self.entities[entity.0];

            if let Some(found) = entity.tables().find(|id| self.tables[id.0].name == name) {
                if entity.id != owner {
                    return Err(Error::invalid_blueprint(format!(
                        "parent table `{name}` of `{}` must belong to the owning entity `{}`",
                        child.name, self.entities[owner.0].name
                    )));
                }
                return Ok(found);
            }

            ancestor = entity.parent.map(|(parent, _)| parent);
        }

        Err(Error::invalid_blueprint(format!(
            "parent table `{name}` of `{}` is not an ancestor table",
            child.name
        )))
    }
}

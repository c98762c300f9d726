use super::{
    row::{key_of, parent_key_of},
    tracked::RowRef,
    Engine,
};

use stowage_core::{
    err,
    schema::{EntityBlueprint, EntityId, FieldKind, Instance, RowView, VariantTag},
    stmt::{TableValue, Value},
    Result,
};

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One populated entity, waiting for its children to be attached.
struct Node {
    entity: EntityId,
    instance: Box<Instance>,
    tag: Option<VariantTag>,

    /// Normalized key of the entity's main table row
    key: TableValue,

    /// Index of the owning node; `None` for roots
    parent: Option<usize>,

    /// Index of the root node of the aggregate
    root: usize,

    /// Children attached bottom-up, with the index of the field holding them
    pending: Vec<(usize, Box<Instance>)>,
}

/// The rows one select produced for a single entity, split per table.
struct EntityRow {
    /// Normalized values of the main table, then of each joined table; `None`
    /// for an absent joined row
    tables: Vec<Option<Vec<Value>>>,
}

impl Engine<'_> {
    /// Loads the aggregates rooted at `ids`, given in storage form.
    ///
    /// Ids with a null component and repeated ids are ignored. Aggregates come
    /// back in root key order; ids with no row are left out.
    pub(crate) async fn fetch(&mut self, ids: Vec<TableValue>) -> Result<Vec<Box<Instance>>> {
        let ids: IndexSet<TableValue> = ids.into_iter().filter(|id| !id.has_null()).collect();

        if ids.is_empty() {
            return Ok(vec![]);
        }

        let params: Vec<Value> = ids.iter().flat_map(|id| id.values().iter().cloned()).collect();
        let blueprint = self.blueprint;
        let templates = self.templates;

        let mut nodes: Vec<Node> = vec![];
        let mut index: HashMap<(EntityId, TableValue), usize> = HashMap::new();

        for entity in &blueprint.entities {
            let main = blueprint.table(entity.table);
            let records = self
                .query(&main.name, &templates.select[entity.id.0], &[ids.len()], params.clone())
                .await?;

            let mut current: Option<TableValue> = None;
            let mut last_parent: Option<(TableValue, usize)> = None;
            let mut populated = 0;

            for record in records {
                let row = self.split_row(entity, record.into_vec())?;
                let main_values = row.tables[0].as_deref().unwrap_or_default();
                let key = key_of(main, main_values);

                if key.has_null() {
                    continue;
                }

                // Rows repeating the current key fold into the open entity.
                if current.as_ref() == Some(&key) {
                    continue;
                }
                current = Some(key.clone());

                if index.contains_key(&(entity.id, key.clone())) {
                    continue;
                }

                let parent = match entity.parent {
                    None => None,
                    Some((parent_entity, _)) => {
                        let parent_key = parent_key_of(main, main_values);

                        let cached = last_parent
                            .as_ref()
                            .filter(|(key, _)| key == &parent_key)
                            .map(|(_, node)| *node);

                        let found = cached.or_else(|| {
                            index.get(&(parent_entity, parent_key.clone())).copied()
                        });

                        match found {
                            Some(node) => {
                                last_parent = Some((parent_key, node));
                                Some(node)
                            }
                            None => {
                                warn!(
                                    entity = %entity.name,
                                    key = %key,
                                    parent = %parent_key,
                                    "skipping row whose parent was not populated"
                                );
                                continue;
                            }
                        }
                    }
                };

                let (instance, tag) = self.instantiate(entity, &row)?;
                let position = nodes.len();
                let root = parent.map_or(position, |parent| nodes[parent].root);

                let root_ref = match parent {
                    None => RowRef::new(&main.name, key.clone()),
                    Some(_) => {
                        let root = &nodes[root];
                        RowRef::new(&blueprint.root_table().name, root.key.clone())
                    }
                };

                for (table, values) in entity.tables().zip(&row.tables) {
                    if let Some(values) = values {
                        let table = blueprint.table(table);
                        self.tracked.insert(
                            RowRef::new(&table.name, key.clone()),
                            values.clone(),
                            root_ref.clone(),
                        );
                    }
                }

                index.insert((entity.id, key.clone()), position);
                nodes.push(Node {
                    entity: entity.id,
                    instance,
                    tag,
                    key,
                    parent,
                    root,
                    pending: vec![],
                });
                populated += 1;
            }

            debug!(entity = %entity.name, populated, "populated entity rows");

            if !entity.sides.is_empty() {
                self.populate_sides(entity, &mut nodes).await?;
            }
        }

        self.assemble(nodes)
    }

    /// Splits a select row into the main table's values and each joined
    /// table's, normalizing every present table.
    fn split_row(&self, entity: &EntityBlueprint, values: Vec<Value>) -> Result<EntityRow> {
        let mut tables = Vec::with_capacity(1 + entity.joined.len());
        let mut offset = 0;

        for id in entity.tables() {
            let table = self.blueprint.table(id);
            let end = offset + table.columns.len();
            let slice = values
                .get(offset..end)
                .ok_or_else(|| err!("row of `{}` is missing columns", table.name))?;

            let present =
                table.is_main() || table.primary_key.iter().any(|i| !slice[*i].is_null());

            tables.push(if present {
                Some(self.normalize_row(table, slice)?)
            } else {
                None
            });

            offset = end;
        }

        Ok(EntityRow { tables })
    }

    /// Builds the entity (or variant) a row describes and copies its fields.
    fn instantiate(
        &self,
        entity: &EntityBlueprint,
        row: &EntityRow,
    ) -> Result<(Box<Instance>, Option<VariantTag>)> {
        let tables: Vec<_> = entity.tables().map(|id| self.blueprint.table(id)).collect();

        let (mut instance, tag) = match &entity.discriminator {
            Some(discriminator) => {
                let mut view = RowView::new();

                for (table, values) in tables.iter().zip(&row.tables) {
                    let Some(values) = values else { continue };

                    for (column, value) in table.columns.iter().zip(values) {
                        view.push(&table.name, &column.name, value);
                    }
                }

                let variant = discriminator.resolve(&entity.name, &view)?;
                (variant.construct(), Some(variant.tag.clone()))
            }
            None => (entity.construct()?, None),
        };

        for field in &entity.fields {
            if !field.applies_to(tag.as_ref()) {
                continue;
            }

            let FieldKind::Columns {
                table,
                columns,
                access,
                ..
            } = &field.kind
            else {
                continue;
            };

            let Some(position) = entity.tables().position(|id| id == *table) else {
                continue;
            };

            // An absent joined row leaves its fields at their defaults.
            let Some(values) = &row.tables[position] else {
                continue;
            };

            let table = tables[position];
            let loaded = columns
                .iter()
                .map(|i| self.load(entity, &table.columns[*i], values[*i].clone()))
                .collect::<Result<Vec<_>>>()?;

            access.set(instance.as_mut(), loaded)?;
        }

        Ok((instance, tag))
    }

    /// Loads every side-table field of `entity` with one select per field
    /// across all populated owners.
    async fn populate_sides(&mut self, entity: &EntityBlueprint, nodes: &mut [Node]) -> Result<()> {
        let owners: IndexMap<TableValue, usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.entity == entity.id)
            .map(|(position, node)| (node.key.clone(), position))
            .collect();

        if owners.is_empty() {
            return Ok(());
        }

        let blueprint = self.blueprint;
        let templates = self.templates;
        let root_table = &blueprint.root_table().name;

        for side_id in &entity.sides {
            let side = blueprint.side(*side_id);
            let field = &entity.fields[side.field];

            let FieldKind::Side { access, .. } = &field.kind else {
                continue;
            };

            let params = owners
                .keys()
                .flat_map(|key| key.values().iter().cloned())
                .collect();

            let records = self
                .query(&side.name, &templates.side(side.id).select, &[owners.len()], params)
                .await?;

            let mut values: HashMap<TableValue, (Vec<Value>, Vec<Value>)> = HashMap::new();

            for record in records {
                let mut record = record.into_vec().into_iter();
                let (Some(owner), Some(value)) = (record.next(), record.next()) else {
                    continue;
                };

                let owner = self
                    .converters
                    .from_db(side.key_ty, side.key_converter.as_ref(), owner)?;
                let owner = self.converters.to_db(side.key_ty, side.key_converter.as_ref(), owner)?;
                let value = self.converters.from_db(side.value_ty, None, value)?;
                let stored = self.converters.to_db(side.value_ty, None, value.clone())?;

                let entry = values.entry(TableValue::single(owner)).or_default();
                entry.0.push(value);
                entry.1.push(stored);
            }

            for (key, position) in &owners {
                let node = &mut nodes[*position];

                if !field.applies_to(node.tag.as_ref()) {
                    continue;
                }

                let (loaded, stored) = values.remove(key).unwrap_or_default();
                access.set(node.instance.as_mut(), loaded)?;

                let root = &nodes[nodes[*position].root];
                let root_ref = RowRef::new(root_table, root.key.clone());
                self.tracked
                    .insert(RowRef::new(&side.name, key.clone()), stored, root_ref);
            }
        }

        Ok(())
    }

    /// Attaches every node to its owner, deepest first, and returns the
    /// roots in row order.
    fn assemble(&self, mut nodes: Vec<Node>) -> Result<Vec<Box<Instance>>> {
        let mut roots = vec![];

        while let Some(mut node) = nodes.pop() {
            let entity = self.blueprint.entity(node.entity);
            node.pending.reverse();

            for (position, field) in entity.fields.iter().enumerate() {
                let FieldKind::Child { access, .. } = &field.kind else {
                    continue;
                };

                if !field.applies_to(node.tag.as_ref()) {
                    continue;
                }

                let (items, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut node.pending)
                    .into_iter()
                    .partition(|(field, _)| *field == position);

                node.pending = rest;
                access.assign(
                    node.instance.as_mut(),
                    items.into_iter().map(|(_, item)| item).collect(),
                )?;
            }

            match (node.parent, entity.parent) {
                (Some(parent), Some((_, field))) => {
                    nodes[parent].pending.push((field, node.instance));
                }
                _ => roots.push(node.instance),
            }
        }

        roots.reverse();
        Ok(roots)
    }

    /// Runs the root-id select restricted by `clause` and returns the
    /// matching root keys in storage form.
    pub(crate) async fn root_ids(
        &mut self,
        clause: &str,
        params: Vec<Value>,
    ) -> Result<Vec<TableValue>> {
        let blueprint = self.blueprint;
        let table = blueprint.root_table();
        let template = self.templates.root_ids.with_where(clause);
        let records = self.query(&table.name, &template, &[], params).await?;

        records
            .into_iter()
            .map(|record| {
                let entity = blueprint.root();
                let values = record
                    .into_vec()
                    .into_iter()
                    .zip(table.primary_key_columns())
                    .map(|(value, column)| self.normalize(entity, column, value))
                    .collect::<Result<Vec<_>>>()?;

                Ok(TableValue::new(values))
            })
            .collect()
    }
}

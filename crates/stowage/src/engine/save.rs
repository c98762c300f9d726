use super::{row::key_of, tracked::RowRef, Engine};

use stowage_core::{
    bail, err,
    schema::{
        EntityBlueprint, EntityId, FieldKind, Instance, SideId, SideTableBlueprint,
        TableBlueprint, TableId, ValueAccess, VariantTag,
    },
    stmt::{TableValue, Value},
    Error, Result, StatementKind,
};
use stowage_sql::Target;

use async_recursion::async_recursion;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// What one save has written so far.
#[derive(Debug, Default)]
struct SaveState {
    /// Root row of the aggregate being saved, once its key is known
    root: Option<RowRef>,

    /// Keys written per table, in write order
    kept: HashMap<TableId, Vec<TableValue>>,

    /// Owner keys whose side rows were written, per side table
    kept_owners: HashMap<SideId, Vec<TableValue>>,

    /// Every row the aggregate still has
    touched: HashSet<RowRef>,

    /// Values of the written rows, recorded as tracked once the save succeeds
    staged: Vec<(RowRef, Vec<Value>)>,
}

/// An auto-increment key the store has not assigned yet.
fn is_unassigned(value: &Value) -> bool {
    value.is_null() || value.as_i64() == Some(0)
}

/// Records a row as written and kept. Returns its key.
fn stage(state: &mut SaveState, table: &TableBlueprint, values: Vec<Value>) -> TableValue {
    let key = key_of(table, &values);
    let row = RowRef::new(&table.name, key.clone());

    if table.is_root() && state.root.is_none() {
        state.root = Some(row.clone());
    }

    state.staged.push((row.clone(), values));
    state.touched.insert(row);
    state.kept.entry(table.id).or_default().push(key.clone());

    key
}

fn next_version(current: &Value) -> Result<Value> {
    match current {
        Value::I32(v) => v
            .checked_add(1)
            .map(Value::I32)
            .ok_or_else(|| err!("version {v} overflows")),
        Value::I64(v) => v
            .checked_add(1)
            .map(Value::I64)
            .ok_or_else(|| err!("version {v} overflows")),
        value => bail!("version column holds a non-integer value {value}"),
    }
}

impl<'a> Engine<'a> {
    /// Persists the aggregate rooted at `instance` and removes the rows it no
    /// longer has.
    ///
    /// Generated keys and incremented versions are written back into the
    /// entities.
    pub(crate) async fn save(&mut self, instance: &mut Instance) -> Result<()> {
        let blueprint = self.blueprint;
        let root_table = &blueprint.root_table().name;
        let mut state = SaveState::default();

        // A root read or written earlier in the session has every row
        // tracked, so only tables left with untouched rows need pruning.
        let known = self
            .root_key_of(instance)
            .ok()
            .map(|key| RowRef::new(root_table, key))
            .filter(|root| self.tracked.get(root).is_some());

        if !blueprint.main_table_inserted_first {
            let key = self.root_key_of(instance)?;

            if key.has_null() {
                bail!("cannot save `{}` without a key", blueprint.root().name);
            }

            state.root = Some(RowRef::new(root_table, key));
        }

        self.save_entity(&mut state, blueprint.root().id, instance, None, 0)
            .await?;

        let stale = known.map(|root| self.tracked.stale_tables(&root, &state.touched));
        self.prune(&state, stale.as_ref()).await?;

        // Written rows only become tracked once nothing failed; the caller
        // may roll back a failed save.
        if let Some(root) = state.root.take() {
            for (row, values) in state.staged.drain(..) {
                self.tracked.insert(row, values, root.clone());
            }
            self.tracked.retain_root(&root, &state.touched);
        }

        Ok(())
    }

    #[async_recursion]
    async fn save_entity(
        &mut self,
        state: &mut SaveState,
        id: EntityId,
        instance: &mut Instance,
        parent_key: Option<TableValue>,
        index: usize,
    ) -> Result<()> {
        let blueprint = self.blueprint;
        let entity = blueprint.entity(id);
        let tag = entity.variant_of(instance)?;

        if entity.parent.is_some() || blueprint.main_table_inserted_first {
            let key = self
                .write_rows(state, entity, instance, parent_key.as_ref(), index, tag.as_ref())
                .await?;
            self.save_owned(state, entity, instance, &key, tag.as_ref())
                .await?;
        } else {
            let key = state
                .root
                .as_ref()
                .map(|root| root.key.clone())
                .ok_or_else(|| err!("root key of `{}` is unknown", entity.name))?;

            self.save_owned(state, entity, instance, &key, tag.as_ref())
                .await?;
            self.write_rows(state, entity, instance, None, index, tag.as_ref())
                .await?;
        }

        Ok(())
    }

    /// Writes the entity's main table row, then the joined rows of its
    /// current variant. Returns the main row's key.
    async fn write_rows(
        &mut self,
        state: &mut SaveState,
        entity: &'a EntityBlueprint,
        instance: &mut Instance,
        parent_key: Option<&TableValue>,
        index: usize,
        tag: Option<&VariantTag>,
    ) -> Result<TableValue> {
        let blueprint = self.blueprint;
        let main = blueprint.table(entity.table);
        let key = self
            .write_row(state, entity, main, instance, parent_key, index, tag)
            .await?;

        for id in &entity.joined {
            let table = blueprint.table(*id);

            if table.variant.is_some() && table.variant.as_ref() != tag {
                continue;
            }

            self.write_row(state, entity, table, instance, Some(&key), index, tag)
                .await?;
        }

        Ok(key)
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_row(
        &mut self,
        state: &mut SaveState,
        entity: &'a EntityBlueprint,
        table: &'a TableBlueprint,
        instance: &mut Instance,
        parent_key: Option<&TableValue>,
        index: usize,
        tag: Option<&VariantTag>,
    ) -> Result<TableValue> {
        let templates = self.templates;
        let templates = templates.table(table.id);
        let mut values = self.row_values(table, instance, parent_key, index, tag)?;

        if let Some(column) = table.auto_increment() {
            if is_unassigned(&values[column]) {
                let template = templates
                    .insert_generated
                    .as_ref()
                    .ok_or_else(|| err!("`{}` has no insert for generated keys", table.name))?;

                let params = values
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != column)
                    .map(|(_, value)| value.clone())
                    .collect();

                let generated = self
                    .insert_returning_key(&table.name, template, params)
                    .await?;
                let stored = self.normalize(entity, &table.columns[column], generated)?;

                self.assign_column(table, column, instance, stored.clone())?;
                values[column] = stored;

                return Ok(stage(state, table, values));
            }
        }

        let key = key_of(table, &values);

        if key.has_null() {
            bail!("cannot save a row of `{}` with a null key", table.name);
        }

        let row = RowRef::new(&table.name, key.clone());
        let tracked = self.tracked.get(&row).map(|tracked| tracked.values.clone());

        if tracked.as_ref() == Some(&values) {
            debug!(table = %table.name, %key, "row unchanged; skipping");
            return Ok(stage(state, table, values));
        }

        let version = entity.version.filter(|_| table.is_main());
        let mut expected = None;

        if let Some(version) = version {
            let current = values[version.column].clone();
            values[version.column] = next_version(&current)?;
            expected = Some(current);
        }

        let mut params: Vec<Value> = table
            .non_primary_key_columns()
            .map(|(i, _)| values[i].clone())
            .collect();
        params.extend(table.primary_key.iter().map(|i| values[*i].clone()));
        params.extend(expected.clone());

        let updated = self
            .execute(StatementKind::Update, &table.name, &templates.update, &[], params)
            .await?;

        if updated == 0 {
            if expected.is_some() && tracked.is_some() {
                return Err(Error::concurrency_conflict(&table.name, key.to_string()));
            }

            if let (Some(version), Some(expected)) = (version, expected) {
                values[version.column] = expected;
            }

            self.execute(
                StatementKind::Insert,
                &table.name,
                &templates.insert,
                &[],
                values.clone(),
            )
            .await?;
        } else if let Some(version) = version {
            self.assign_column(table, version.column, instance, values[version.column].clone())?;
        }

        Ok(stage(state, table, values))
    }

    /// Saves the children and side-table collections of an entity whose main
    /// row has key `key`.
    async fn save_owned(
        &mut self,
        state: &mut SaveState,
        entity: &'a EntityBlueprint,
        instance: &mut Instance,
        key: &TableValue,
        tag: Option<&VariantTag>,
    ) -> Result<()> {
        let blueprint = self.blueprint;

        for field in &entity.fields {
            if !field.applies_to(tag) {
                continue;
            }

            match &field.kind {
                FieldKind::Child { entity: child, access } => {
                    let items = access.items_mut(instance)?;

                    for (index, item) in items.into_iter().enumerate() {
                        self.save_entity(state, *child, item, Some(key.clone()), index)
                            .await?;
                    }
                }
                FieldKind::Side { side, access } => {
                    self.save_side(state, blueprint.side(*side), access, instance, key)
                        .await?;
                }
                FieldKind::Columns { .. } => {}
            }
        }

        Ok(())
    }

    /// Replaces the side rows of one owner with the field's current values,
    /// duplicates collapsed.
    async fn save_side(
        &mut self,
        state: &mut SaveState,
        side: &'a SideTableBlueprint,
        access: &'a ValueAccess,
        instance: &Instance,
        owner: &TableValue,
    ) -> Result<()> {
        let templates = self.templates;
        let templates = templates.side(side.id);

        let distinct = access
            .get(instance)?
            .into_iter()
            .map(|value| {
                let stored = self.converters.to_db(side.value_ty, None, value)?;
                Ok(TableValue::single(stored))
            })
            .collect::<Result<IndexSet<_>>>()?;

        let values: Vec<Value> = distinct.into_iter().flat_map(TableValue::into_values).collect();
        let owner_key = owner
            .values()
            .first()
            .cloned()
            .ok_or_else(|| err!("owner of `{}` has an empty key", side.name))?;

        let row = RowRef::new(&side.name, owner.clone());
        let unchanged = self
            .tracked
            .get(&row)
            .is_some_and(|tracked| tracked.values == values);

        if unchanged {
            debug!(table = %side.name, key = %owner, "side rows unchanged; skipping");
        } else {
            self.execute(
                StatementKind::Delete,
                &side.name,
                &templates.delete_by_owner,
                &[],
                vec![owner_key.clone()],
            )
            .await?;

            for (position, value) in values.iter().enumerate() {
                let mut params = vec![owner_key.clone(), value.clone()];

                if side.order_column.is_some() {
                    params.push(Value::I64(position as i64));
                }

                self.execute(StatementKind::Insert, &side.name, &templates.insert, &[], params)
                    .await?;
            }
        }

        state.staged.push((row.clone(), values));
        state.touched.insert(row);
        state.kept_owners.entry(side.id).or_default().push(owner.clone());

        Ok(())
    }

    /// Deletes the rows of the saved aggregate that were not written, deepest
    /// table first. With `stale` set, only those tables are visited.
    async fn prune(&mut self, state: &SaveState, stale: Option<&HashSet<String>>) -> Result<()> {
        let blueprint = self.blueprint;
        let templates = self.templates;

        let Some(root) = &state.root else {
            return Ok(());
        };

        for target in &templates.prune_order {
            let name = match *target {
                Target::Table(id) => &blueprint.table(id).name,
                Target::Side(id) => &blueprint.side(id).name,
            };

            if stale.is_some_and(|stale| !stale.contains(name)) {
                continue;
            }

            match *target {
                Target::Table(id) => {
                    let table = blueprint.table(id);
                    let statements = templates.table(id);
                    let kept = state.kept.get(&id).map(Vec::as_slice).unwrap_or_default();

                    let (template, lens) = match (table.depth, kept.is_empty()) {
                        (1, true) => (statements.delete_children.as_ref(), vec![]),
                        (1, false) => {
                            (statements.delete_children_except.as_ref(), vec![kept.len()])
                        }
                        (depth, true) => (Some(statements.orphans(depth)), vec![1]),
                        (depth, false) => (statements.orphans_except(depth), vec![1, kept.len()]),
                    };

                    let template =
                        template.ok_or_else(|| err!("`{}` has no prune statement", table.name))?;

                    let mut params = root.key.values().to_vec();
                    params.extend(kept.iter().flat_map(|key| key.values().iter().cloned()));

                    self.execute(StatementKind::Delete, &table.name, template, &lens, params)
                        .await?;
                }
                Target::Side(id) => {
                    let side = blueprint.side(id);
                    let statements = templates.side(id);
                    let kept = state
                        .kept_owners
                        .get(&id)
                        .map(Vec::as_slice)
                        .unwrap_or_default();

                    // The root's side rows are rewritten in place; only a
                    // field the root's variant lacks leaves stale rows.
                    if blueprint.table(side.owner).is_root() {
                        if kept.is_empty() {
                            self.execute(
                                StatementKind::Delete,
                                &side.name,
                                &statements.delete_by_owner,
                                &[],
                                root.key.values().to_vec(),
                            )
                            .await?;
                        }
                        continue;
                    }

                    let (template, lens) = if kept.is_empty() {
                        (statements.orphans(side.depth), vec![1])
                    } else {
                        (statements.orphans_except(side.depth), vec![1, kept.len()])
                    };

                    let template =
                        template.ok_or_else(|| err!("`{}` has no prune statement", side.name))?;

                    let mut params = root.key.values().to_vec();
                    params.extend(kept.iter().flat_map(|key| key.values().iter().cloned()));

                    self.execute(StatementKind::Delete, &side.name, template, &lens, params)
                        .await?;
                }
            }
        }

        Ok(())
    }
}

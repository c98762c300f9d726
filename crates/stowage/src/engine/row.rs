//! Moving values between entity instances and table rows.
//!
//! Three representations meet here. Fields hold in-memory values; statements
//! bind storage values (`store`); rows read back are normalized to the same
//! storage form (`normalize`) so keys and tracked state compare equal to what
//! a save computes, whatever width or type the driver reported.

use super::Engine;

use stowage_core::{
    bail, err,
    schema::{
        ColumnBlueprint, ColumnSource, EntityBlueprint, FieldKind, Instance, TableBlueprint,
        VariantTag,
    },
    stmt::{ScalarType, TableValue, Value},
    Result,
};

/// The key of a row given all of its column values.
pub(super) fn key_of(table: &TableBlueprint, values: &[Value]) -> TableValue {
    TableValue::new(table.primary_key.iter().map(|i| values[*i].clone()).collect())
}

/// The parent-key columns of a row given all of its column values.
pub(super) fn parent_key_of(table: &TableBlueprint, values: &[Value]) -> TableValue {
    TableValue::new(table.parent_key.iter().map(|i| values[*i].clone()).collect())
}

/// True if the column's values pass through the converter registry. Custom
/// mappers exchange storage values directly.
fn is_converted(entity: &EntityBlueprint, column: &ColumnBlueprint) -> bool {
    match column.source {
        ColumnSource::Field { field, .. } => match &entity.fields[field].kind {
            FieldKind::Columns { converted, .. } => *converted,
            _ => true,
        },
        _ => true,
    }
}

/// Widens or narrows a key supplied by a caller to the column's integer or
/// float type, so `1` finds a row keyed by a 64-bit column.
fn coerce(ty: ScalarType, value: Value) -> Result<Value> {
    Ok(match (ty, value) {
        (ScalarType::I64, Value::I32(v)) => Value::I64(v.into()),
        (ScalarType::I32, Value::I64(v)) => Value::I32(
            i32::try_from(v).map_err(|_| err!("key {v} does not fit a 32-bit column"))?,
        ),
        (ScalarType::F64, Value::I32(v)) => Value::F64(v.into()),
        (_, value) => value,
    })
}

impl Engine<'_> {
    /// Storage value → in-memory value.
    pub(super) fn load(
        &self,
        entity: &EntityBlueprint,
        column: &ColumnBlueprint,
        value: Value,
    ) -> Result<Value> {
        if is_converted(entity, column) {
            self.converters
                .from_db(column.ty, column.converter.as_ref(), value)
        } else {
            Ok(value)
        }
    }

    /// In-memory value → storage value.
    pub(super) fn store(
        &self,
        entity: &EntityBlueprint,
        column: &ColumnBlueprint,
        value: Value,
    ) -> Result<Value> {
        if is_converted(entity, column) {
            self.converters.to_db(column.ty, column.converter.as_ref(), value)
        } else {
            Ok(value)
        }
    }

    pub(super) fn normalize(
        &self,
        entity: &EntityBlueprint,
        column: &ColumnBlueprint,
        value: Value,
    ) -> Result<Value> {
        let value = self.load(entity, column, value)?;
        self.store(entity, column, value)
    }

    /// Normalizes the values `table` contributed to a result row.
    pub(super) fn normalize_row(
        &self,
        table: &TableBlueprint,
        values: &[Value],
    ) -> Result<Vec<Value>> {
        let entity = self.blueprint.entity(table.entity);

        table
            .columns
            .iter()
            .zip(values)
            .map(|(column, value)| self.normalize(entity, column, value.clone()))
            .collect()
    }

    /// Computes the storage values of every column of `table` for `instance`.
    ///
    /// `parent_key` fills the parent-key columns; `index` is the instance's
    /// position in its collection; `tag` its current variant. Fields that do
    /// not apply to the variant are stored as null.
    pub(super) fn row_values(
        &self,
        table: &TableBlueprint,
        instance: &Instance,
        parent_key: Option<&TableValue>,
        index: usize,
        tag: Option<&VariantTag>,
    ) -> Result<Vec<Value>> {
        let entity = self.blueprint.entity(table.entity);
        let mut fields: Vec<Option<Vec<Value>>> = vec![None; entity.fields.len()];
        let mut values = Vec::with_capacity(table.columns.len());

        for column in &table.columns {
            let value = match column.source {
                ColumnSource::Field { field, component } => {
                    let blueprint = &entity.fields[field];

                    if !blueprint.applies_to(tag) {
                        Value::Null
                    } else {
                        let FieldKind::Columns { access, .. } = &blueprint.kind else {
                            bail!(
                                "field `{}` of `{}` does not map to columns",
                                blueprint.name,
                                entity.name
                            );
                        };

                        if fields[field].is_none() {
                            fields[field] = Some(access.get(instance)?);
                        }

                        let value = fields[field]
                            .as_ref()
                            .and_then(|values| values.get(component))
                            .cloned()
                            .unwrap_or_default();

                        self.store(entity, column, value)?
                    }
                }
                ColumnSource::ParentKey { component } => parent_key
                    .and_then(|key| key.values().get(component))
                    .cloned()
                    .ok_or_else(|| err!("row of `{}` has no parent key", table.name))?,
                ColumnSource::ListIndex => Value::I64(index as i64),
                ColumnSource::Discriminator => match tag {
                    Some(tag) => Value::String(tag.as_str().to_string()),
                    None => Value::Null,
                },
            };

            values.push(value);
        }

        Ok(values)
    }

    /// The storage key of the aggregate rooted at `instance`.
    pub(crate) fn root_key_of(&self, instance: &Instance) -> Result<TableValue> {
        let entity = self.blueprint.root();
        let table = self.blueprint.root_table();
        let tag = entity.variant_of(instance)?;
        let values = self.row_values(table, instance, None, 0, tag.as_ref())?;

        Ok(key_of(table, &values))
    }

    /// Converts a root key supplied by a caller to its storage form.
    pub(crate) fn root_key_to_db(&self, id: TableValue) -> Result<TableValue> {
        let entity = self.blueprint.root();
        let table = self.blueprint.root_table();

        if id.len() != table.primary_key.len() {
            bail!(
                "`{}` has a {}-column key but {} value(s) were supplied",
                table.name,
                table.primary_key.len(),
                id.len()
            );
        }

        let values = table
            .primary_key_columns()
            .zip(id.into_values())
            .map(|(column, value)| self.store(entity, column, coerce(column.ty, value)?))
            .collect::<Result<Vec<_>>>()?;

        Ok(TableValue::new(values))
    }

    /// Writes a value read back from the store (a generated key) into the
    /// field behind `column`.
    pub(super) fn assign_column(
        &self,
        table: &TableBlueprint,
        column: usize,
        instance: &mut Instance,
        stored: Value,
    ) -> Result<()> {
        let entity = self.blueprint.entity(table.entity);
        let ColumnSource::Field { field, .. } = table.columns[column].source else {
            return Ok(());
        };

        let FieldKind::Columns { access, columns, .. } = &entity.fields[field].kind else {
            return Ok(());
        };

        if columns.len() != 1 {
            bail!(
                "generated key `{}` of `{}` must map to a single-column field",
                table.columns[column].name,
                table.name
            );
        }

        let value = self.load(entity, &table.columns[column], stored)?;
        access.set(instance, vec![value])
    }
}

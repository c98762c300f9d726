use super::{Blueprint, ColumnSource, Result, TableRole, VariantTag};
use crate::Error;

use std::collections::HashSet;

struct Verify<'a> {
    blueprint: &'a Blueprint,
}

impl Blueprint {
    pub(super) fn verify(&self) -> Result<()> {
        Verify { blueprint: self }.verify()
    }
}

impl Verify<'_> {
    fn verify(&self) -> Result<()> {
        self.verify_table_names_are_unique()?;
        self.verify_field_names_are_unique()?;
        self.verify_column_names_are_unique()?;
        self.verify_auto_increment_is_primary_key()?;
        self.verify_each_table_has_primary_key()?;
        self.verify_keyless_entities_derive_key()?;
        self.verify_joined_tables_share_key()?;
        self.verify_variants_are_declared()?;
        self.verify_generated_keys_precede_children()?;
        Ok(())
    }

    fn verify_table_names_are_unique(&self) -> Result<()> {
        let mut names = HashSet::new();

        let tables = self.blueprint.tables.iter().map(|table| &table.name);
        let sides = self.blueprint.sides.iter().map(|side| &side.name);

        for name in tables.chain(sides) {
            if !names.insert(name) {
                return Err(invalid(format!("duplicate table name `{name}`")));
            }
        }

        Ok(())
    }

    fn verify_field_names_are_unique(&self) -> Result<()> {
        for entity in &self.blueprint.entities {
            let mut names = HashSet::new();

            for field in &entity.fields {
                if !names.insert(&field.name) {
                    return Err(invalid(format!(
                        "duplicate field name `{}` in `{}`",
                        field.name, entity.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_column_names_are_unique(&self) -> Result<()> {
        for table in &self.blueprint.tables {
            let mut names = HashSet::new();

            for column in &table.columns {
                if !names.insert(&column.name) {
                    return Err(invalid(format!(
                        "duplicate column name `{}` in `{}`",
                        column.name, table.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_auto_increment_is_primary_key(&self) -> Result<()> {
        for table in &self.blueprint.tables {
            for column in &table.columns {
                if column.auto_increment && !column.primary_key {
                    return Err(invalid(format!(
                        "column `{}` of `{}` is auto-increment but not part of the primary key",
                        column.name, table.name
                    )));
                }
            }

            if table.auto_increment().is_some() && table.primary_key.len() != 1 {
                return Err(invalid(format!(
                    "auto-increment table `{}` must have a single-column primary key",
                    table.name
                )));
            }
        }

        Ok(())
    }

    fn verify_each_table_has_primary_key(&self) -> Result<()> {
        for table in &self.blueprint.tables {
            if table.primary_key.is_empty() {
                return Err(invalid(format!("table `{}` has no primary-key columns", table.name)));
            }
        }

        Ok(())
    }

    /// An entity without primary-key fields is identified by where it sits in
    /// its parent, so its table key may only use columns the engine fills in.
    fn verify_keyless_entities_derive_key(&self) -> Result<()> {
        for entity in &self.blueprint.entities {
            if !entity.primary_key.is_empty() {
                continue;
            }

            let table = self.blueprint.table(entity.table);

            if entity.parent.is_none() {
                return Err(invalid(format!(
                    "root entity `{}` must declare primary-key fields",
                    entity.name
                )));
            }

            for column in table.primary_key_columns() {
                if !matches!(
                    column.source,
                    ColumnSource::ParentKey { .. } | ColumnSource::ListIndex
                ) {
                    return Err(invalid(format!(
                        "entity `{}` has no primary-key fields, so key column `{}` of `{}` must be a parent-key or list-index column",
                        entity.name, column.name, table.name
                    )));
                }
            }
        }

        Ok(())
    }

    fn verify_joined_tables_share_key(&self) -> Result<()> {
        for table in &self.blueprint.tables {
            if table.role != TableRole::Joined {
                continue;
            }

            let mut pk = table.primary_key.clone();
            let mut fk = table.parent_key.clone();
            pk.sort_unstable();
            fk.sort_unstable();

            if pk != fk {
                return Err(invalid(format!(
                    "joined table `{}` must be keyed by its parent-key columns",
                    table.name
                )));
            }
        }

        Ok(())
    }

    fn verify_variants_are_declared(&self) -> Result<()> {
        for entity in &self.blueprint.entities {
            let declared = |tag: &VariantTag| {
                entity
                    .discriminator
                    .as_ref()
                    .is_some_and(|discriminator| discriminator.variant(tag).is_some())
            };

            for field in &entity.fields {
                if let Some(tag) = &field.variant {
                    if !declared(tag) {
                        return Err(invalid(format!(
                            "field `{}` of `{}` names undeclared variant `{tag}`",
                            field.name, entity.name
                        )));
                    }
                }
            }

            for table in entity.joined.iter().map(|id| self.blueprint.table(*id)) {
                if let Some(tag) = &table.variant {
                    if !declared(tag) {
                        return Err(invalid(format!(
                            "joined table `{}` names undeclared variant `{tag}`",
                            table.name
                        )));
                    }
                }
            }

            if self.blueprint.table(entity.table).variant.is_some() {
                return Err(invalid(format!(
                    "main table `{}` cannot be restricted to a variant",
                    self.blueprint.table(entity.table).name
                )));
            }
        }

        Ok(())
    }

    /// When the root's tables are written last, children are written before
    /// their parent's key could be generated.
    fn verify_generated_keys_precede_children(&self) -> Result<()> {
        if self.blueprint.main_table_inserted_first {
            return Ok(());
        }

        for table in &self.blueprint.tables {
            if table.auto_increment().is_none() {
                continue;
            }

            let has_child_tables = self
                .blueprint
                .tables
                .iter()
                .any(|other| other.parent == Some(table.id));
            let has_side_tables = self.blueprint.sides.iter().any(|side| side.owner == table.id);

            if has_child_tables || has_side_tables {
                return Err(invalid(format!(
                    "table `{}` generates its key and has children, so the main table must be inserted first",
                    table.name
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::invalid_blueprint(message)
}

use super::template;
use crate::{
    fmt::{Assign, ToSql},
    Comma, Conjunction, Ident, Param, Template,
};

use stowage_core::schema::{Blueprint, ColumnBlueprint, TableBlueprint};

pub(super) fn insert(table: &TableBlueprint) -> Template {
    insert_columns(&table.name, table.columns.iter().collect())
}

/// Insert for rows whose key the store generates.
pub(super) fn insert_generated(table: &TableBlueprint) -> Option<Template> {
    let generated = table.auto_increment()?;

    let columns = table
        .columns
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != generated)
        .map(|(_, column)| column)
        .collect();

    Some(insert_columns(&table.name, columns))
}

fn insert_columns(name: &str, columns: Vec<&ColumnBlueprint>) -> Template {
    template(|f| {
        fmt!(
            f,
            "INSERT INTO " Ident(name)
            " (" Comma(columns.iter().map(|column| Ident(&column.name))) ")"
            " VALUES (" Comma(columns.iter().map(|_| Param)) ")"
        );
    })
}

pub(super) fn update(blueprint: &Blueprint, table: &TableBlueprint) -> Template {
    let entity = blueprint.entity(table.entity);
    let version = entity
        .version
        .filter(|_| entity.table == table.id)
        .map(|version| &table.columns[version.column]);

    template(|f| {
        fmt!(f, "UPDATE " Ident(&table.name) " SET ");

        let mut assignments = table
            .non_primary_key_columns()
            .map(|(_, column)| Assign(Ident(&column.name), Param))
            .peekable();

        if assignments.peek().is_some() {
            fmt!(f, Comma(assignments));
        } else {
            // No non-key columns
            let pk = &table.columns[table.primary_key[0]].name;
            fmt!(f, Assign(Ident(pk), Ident(pk)));
        }

        let key = table
            .primary_key_columns()
            .map(|column| Assign(Ident(&column.name), Param));

        fmt!(f, " WHERE " Conjunction(key));

        if let Some(column) = version {
            fmt!(f, " AND " Assign(Ident(&column.name), Param));
        }
    })
}

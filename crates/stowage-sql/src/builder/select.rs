use super::{join_on, key_columns, template};
use crate::{fmt::ToSql, Column, Comma, Formatter, Ident, List, Template, Tuple};

use stowage_core::{
    schema::{Blueprint, EntityBlueprint, TableBlueprint},
    stmt::Direction,
};

/// An `ORDER BY` term
struct Ordered<'a>(Column<'a>, Option<Direction>);

impl ToSql for Ordered<'_> {
    fn to_sql(self, f: &mut Formatter) {
        self.0.to_sql(f);

        if let Some(direction) = self.1 {
            fmt!(f, " " direction.as_sql());
        }
    }
}

pub(super) fn root_ids(blueprint: &Blueprint) -> Template {
    let root = blueprint.root_table();

    template(|f| {
        fmt!(f, "SELECT " Comma(key_columns(root)) " FROM " Ident(&root.name));
    })
}

pub(super) fn entity(blueprint: &Blueprint, entity: &EntityBlueprint) -> Template {
    let main = blueprint.table(entity.table);
    let joined: Vec<_> = entity.joined.iter().map(|id| blueprint.table(*id)).collect();
    let ancestors: Vec<_> = blueprint.ancestors(main.id).collect();
    let root = ancestors.last().copied().unwrap_or(main);

    template(|f| {
        let columns = std::iter::once(main)
            .chain(joined.iter().copied())
            .flat_map(|table| {
                table
                    .columns
                    .iter()
                    .map(move |column| Column(&table.name, &column.name))
            });

        fmt!(f, "SELECT " Comma(columns) " FROM " Ident(&main.name));

        for table in joined.iter().copied() {
            fmt!(f, " " table.join.as_sql() " " Ident(&table.name) " ON " join_on(table, main));
        }

        let mut child = main;
        for parent in ancestors.iter().copied() {
            fmt!(f, " INNER JOIN " Ident(&parent.name) " ON " join_on(child, parent));
            child = parent;
        }

        fmt!(f, " WHERE " Tuple(key_columns(root)) " IN (" List(root.primary_key.len()) ")");

        let terms = std::iter::once(main)
            .chain(ancestors.iter().copied())
            .flat_map(order_terms);

        fmt!(f, " ORDER BY " Comma(terms));
    })
}

/// The table's order column, then its key as a tiebreak.
fn order_terms(table: &TableBlueprint) -> Vec<Ordered<'_>> {
    let mut terms = vec![];
    let order_column = table.order_by.map(|(index, _)| index);

    if let Some((index, direction)) = table.order_by {
        terms.push(Ordered(
            Column(&table.name, &table.columns[index].name),
            Some(direction),
        ));
    }

    for index in &table.primary_key {
        if Some(*index) != order_column {
            terms.push(Ordered(Column(&table.name, &table.columns[*index].name), None));
        }
    }

    terms
}

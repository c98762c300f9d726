use super::{join_on, key_columns, parent_key_columns, template};
use crate::{
    fmt::{Assign, ToSql},
    Column, Comma, Conjunction, Ident, List, Param, Template, Tuple,
};

use stowage_core::schema::TableBlueprint;

pub(super) fn by_key(table: &TableBlueprint) -> Template {
    template(|f| {
        fmt!(
            f,
            "DELETE FROM " Ident(&table.name)
            " WHERE " Tuple(key_columns(table)) " IN (" List(table.primary_key.len()) ")"
        );
    })
}

/// Rows of one parent, optionally keeping a list of keys. `None` for the
/// root's main table.
pub(super) fn children(table: &TableBlueprint, except: bool) -> Option<Template> {
    table.parent?;

    Some(template(|f| {
        let parent_key = parent_key_columns(table)
            .into_iter()
            .map(|column| Assign(column, Param));

        fmt!(f, "DELETE FROM " Ident(&table.name) " WHERE " Conjunction(parent_key));

        if except {
            fmt!(
                f,
                " AND " Tuple(key_columns(table))
                " NOT IN (" List(table.primary_key.len()) ")"
            );
        }
    }))
}

/// A table being deleted from by ancestor key.
pub(super) struct Target<'a> {
    name: &'a str,

    /// Columns referencing the nearest ancestor's key
    parent_key: Vec<&'a str>,
}

impl<'a> Target<'a> {
    pub(super) fn table(table: &'a TableBlueprint) -> Self {
        Self {
            name: &table.name,
            parent_key: table.parent_key_columns().map(|c| c.name.as_str()).collect(),
        }
    }

    pub(super) fn side(name: &'a str, key_column: &'a str) -> Self {
        Self {
            name,
            parent_key: vec![key_column],
        }
    }

    /// Deletes the rows belonging to a list of keys of the ancestor `levels`
    /// up. `ancestors` runs nearest first.
    ///
    /// The restriction is placed on the parent-key columns of the ancestor
    /// one level below, which hold the wanted key, so the ancestor's own row
    /// need not exist anymore.
    pub(super) fn orphans(
        &self,
        ancestors: &[&TableBlueprint],
        levels: usize,
        except: Option<&[&str]>,
    ) -> Template {
        debug_assert!(levels >= 1 && levels <= ancestors.len());

        template(|f| {
            let parent_key = self.parent_key.iter().map(|column| Column(self.name, column));

            fmt!(f, "DELETE FROM " Ident(self.name) " WHERE " Tuple(parent_key) " IN (");

            if levels == 1 {
                fmt!(f, List(self.parent_key.len()));
            } else {
                let nearest = ancestors[0];
                let restricted = ancestors[levels - 2];

                fmt!(f, "SELECT " Comma(key_columns(nearest)) " FROM " Ident(&nearest.name));

                for pair in ancestors[..levels - 1].windows(2) {
                    fmt!(f, " INNER JOIN " Ident(&pair[1].name) " ON " join_on(pair[0], pair[1]));
                }

                fmt!(
                    f,
                    " WHERE " Tuple(parent_key_columns(restricted))
                    " IN (" List(restricted.parent_key.len()) ")"
                );
            }

            fmt!(f, ")");

            if let Some(kept) = except {
                let kept_columns = kept.iter().map(|column| Column(self.name, column));
                fmt!(f, " AND " Tuple(kept_columns) " NOT IN (" List(kept.len()) ")");
            }
        })
    }
}

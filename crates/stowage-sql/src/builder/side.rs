use super::{delete::Target, template};
use crate::{fmt::ToSql, Column, Ident, List, Param, SideTemplates, Template};

use stowage_core::schema::{Blueprint, SideTableBlueprint};

pub(super) fn templates(blueprint: &Blueprint, side: &SideTableBlueprint) -> SideTemplates {
    let owner = blueprint.table(side.owner);
    let ancestors: Vec<_> = std::iter::once(owner)
        .chain(blueprint.ancestors(owner.id))
        .collect();

    let target = Target::side(&side.name, &side.key_column);
    let kept = [side.key_column.as_str()];

    SideTemplates {
        insert: insert(side),
        select: select(side),
        delete_by_owner: template(|f| {
            fmt!(
                f,
                "DELETE FROM " Ident(&side.name)
                " WHERE " Column(&side.name, &side.key_column) " = " Param
            );
        }),
        delete_orphans: (1..=side.depth)
            .map(|levels| target.orphans(&ancestors, levels, None))
            .collect(),
        delete_orphans_except: (1..=side.depth)
            .map(|levels| target.orphans(&ancestors, levels, Some(&kept[..])))
            .collect(),
    }
}

fn insert(side: &SideTableBlueprint) -> Template {
    template(|f| {
        fmt!(
            f,
            "INSERT INTO " Ident(&side.name)
            " (" Ident(&side.key_column) ", " Ident(&side.join_column)
        );

        if let Some(order) = &side.order_column {
            fmt!(f, ", " Ident(order));
        }

        fmt!(f, ") VALUES (" Param ", " Param);

        if side.order_column.is_some() {
            fmt!(f, ", " Param);
        }

        fmt!(f, ")");
    })
}

fn select(side: &SideTableBlueprint) -> Template {
    let sort = side.order_column.as_ref().unwrap_or(&side.join_column);

    template(|f| {
        fmt!(
            f,
            "SELECT " Column(&side.name, &side.key_column) ", " Column(&side.name, &side.join_column)
            " FROM " Ident(&side.name)
            " WHERE " Column(&side.name, &side.key_column) " IN (" List(1) ")"
            " ORDER BY " Column(&side.name, &side.key_column) ", " Column(&side.name, sort)
        );
    })
}

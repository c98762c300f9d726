mod delete;
mod select;
mod side;
mod write;

use super::{
    fmt::Assign, Column, Conjunction, Formatter, Target, TableTemplates, Template, Templates,
};

use stowage_core::schema::{Blueprint, TableBlueprint};

/// Derives every template of `blueprint`.
///
/// The result depends on nothing but the blueprint, so building twice yields
/// identical templates.
pub fn build(blueprint: &Blueprint) -> Templates {
    let templates = Templates {
        root_ids: select::root_ids(blueprint),
        select: blueprint
            .entities
            .iter()
            .map(|entity| select::entity(blueprint, entity))
            .collect(),
        tables: blueprint
            .tables
            .iter()
            .map(|table| table_templates(blueprint, table))
            .collect(),
        sides: blueprint
            .sides
            .iter()
            .map(|side| side::templates(blueprint, side))
            .collect(),
        prune_order: prune_order(blueprint),
    };

    tracing::debug!(
        aggregate = %blueprint.root().name,
        tables = templates.tables.len(),
        sides = templates.sides.len(),
        "built templates"
    );

    templates
}

fn table_templates(blueprint: &Blueprint, table: &TableBlueprint) -> TableTemplates {
    let ancestors: Vec<_> = blueprint.ancestors(table.id).collect();
    let target = delete::Target::table(table);
    let key: Vec<_> = table.primary_key_columns().map(|c| c.name.as_str()).collect();

    let mut delete_orphans = vec![delete::by_key(table)];
    delete_orphans.extend((1..=table.depth).map(|levels| target.orphans(&ancestors, levels, None)));

    let delete_orphans_except = (1..=table.depth)
        .map(|levels| target.orphans(&ancestors, levels, Some(key.as_slice())))
        .collect();

    TableTemplates {
        insert: write::insert(table),
        insert_generated: write::insert_generated(table),
        update: write::update(blueprint, table),
        delete: delete::by_key(table),
        delete_children: delete::children(table, false),
        delete_children_except: delete::children(table, true),
        delete_orphans,
        delete_orphans_except,
    }
}

fn prune_order(blueprint: &Blueprint) -> Vec<Target> {
    let tables = blueprint
        .tables
        .iter()
        .filter(|table| !table.is_root())
        .map(|table| (table.depth, Target::Table(table.id)));
    let sides = blueprint
        .sides
        .iter()
        .map(|side| (side.depth, Target::Side(side.id)));

    let mut order: Vec<_> = tables.chain(sides).collect();
    order.sort_by(|a, b| b.0.cmp(&a.0));
    order.into_iter().map(|(_, target)| target).collect()
}

fn template(build: impl FnOnce(&mut Formatter)) -> Template {
    let mut f = Formatter::default();
    build(&mut f);
    Template::new(f.dst, f.lists)
}

fn key_columns(table: &TableBlueprint) -> Vec<Column<'_>> {
    table
        .primary_key_columns()
        .map(|column| Column(&table.name, &column.name))
        .collect()
}

fn parent_key_columns(table: &TableBlueprint) -> Vec<Column<'_>> {
    table
        .parent_key_columns()
        .map(|column| Column(&table.name, &column.name))
        .collect()
}

/// `child.fk = parent.pk AND ...`
fn join_on<'a>(
    child: &'a TableBlueprint,
    parent: &'a TableBlueprint,
) -> Conjunction<Vec<Assign<Column<'a>, Column<'a>>>> {
    Conjunction(
        parent_key_columns(child)
            .into_iter()
            .zip(key_columns(parent))
            .map(|(fk, pk)| Assign(fk, pk))
            .collect(),
    )
}

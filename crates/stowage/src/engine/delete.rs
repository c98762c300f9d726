use super::{tracked::RowRef, Engine};

use stowage_core::{
    err,
    stmt::{TableValue, Value},
    Result, StatementKind,
};
use stowage_sql::Target;

use indexmap::IndexSet;
use tracing::debug;

impl Engine<'_> {
    /// Deletes the aggregates rooted at `ids`, given in storage form, and
    /// returns how many root rows were removed.
    ///
    /// Each descendant table is cleared with one statement scoped by the root
    /// keys, deepest first; side rows go before their owners.
    pub(crate) async fn delete_roots(&mut self, ids: Vec<TableValue>) -> Result<u64> {
        let ids: IndexSet<TableValue> = ids.into_iter().filter(|id| !id.has_null()).collect();

        if ids.is_empty() {
            return Ok(0);
        }

        let blueprint = self.blueprint;
        let templates = self.templates;
        let root = blueprint.root_table();
        let lens = [ids.len()];
        let params: Vec<Value> = ids.iter().flat_map(|id| id.values().iter().cloned()).collect();

        let mut deleted = 0;

        if !blueprint.main_table_inserted_first {
            deleted = self
                .execute(
                    StatementKind::Delete,
                    &root.name,
                    &templates.table(root.id).delete,
                    &lens,
                    params.clone(),
                )
                .await?;
        }

        for target in &templates.prune_order {
            let (name, template) = match *target {
                Target::Table(id) => {
                    let table = blueprint.table(id);
                    (&table.name, templates.table(id).orphans(table.depth))
                }
                Target::Side(id) => {
                    let side = blueprint.side(id);
                    let template = templates
                        .side(id)
                        .orphans(side.depth)
                        .ok_or_else(|| err!("`{}` has no delete statement", side.name))?;
                    (&side.name, template)
                }
            };

            self.execute(StatementKind::Delete, name, template, &lens, params.clone())
                .await?;
        }

        if blueprint.main_table_inserted_first {
            deleted = self
                .execute(
                    StatementKind::Delete,
                    &root.name,
                    &templates.table(root.id).delete,
                    &lens,
                    params,
                )
                .await?;
        }

        for id in ids {
            self.tracked.forget_root(&RowRef::new(&root.name, id));
        }

        debug!(table = %root.name, deleted, "deleted aggregates");
        Ok(deleted)
    }
}

use super::Template;

use stowage_core::schema::{SideId, TableId};

/// Every statement an aggregate needs, derived once from its blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    /// `SELECT <root pk> FROM <root table>`; callers append a `WHERE` clause.
    pub root_ids: Template,

    /// One select per entity node, indexed by `EntityId`. The select list is
    /// the main table's columns followed by each joined table's, in column
    /// order.
    pub select: Vec<Template>,

    /// Indexed by `TableId`
    pub tables: Vec<TableTemplates>,

    /// Indexed by `SideId`
    pub sides: Vec<SideTemplates>,

    /// Every non-root table and side table, deepest first. Side tables come
    /// before their owner's table.
    pub prune_order: Vec<Target>,
}

/// A table the orchestrator deletes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Table(TableId),
    Side(SideId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTemplates {
    /// Insert with every column
    pub insert: Template,

    /// Insert leaving out the auto-increment key
    pub insert_generated: Option<Template>,

    /// Parameters: non-key columns, key columns, then the expected version
    pub update: Template,

    /// Delete by a list of primary keys
    pub delete: Template,

    /// Delete every row of one parent
    pub delete_children: Option<Template>,

    /// Delete the rows of one parent whose key is not in a kept list
    pub delete_children_except: Option<Template>,

    /// Entry `n` deletes the rows belonging to a list of keys of the table
    /// `n` levels up; entry 0 is the delete by primary key.
    pub delete_orphans: Vec<Template>,

    /// Entry `n - 1` is `delete_orphans[n]` restricted to rows whose key is
    /// not in a kept list.
    pub delete_orphans_except: Vec<Template>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideTemplates {
    pub insert: Template,

    /// Owner key and value of every row for a list of owners
    pub select: Template,

    pub delete_by_owner: Template,

    /// Entry `n - 1` deletes the rows belonging to a list of keys of the
    /// table `n` levels up.
    pub delete_orphans: Vec<Template>,

    /// As `delete_orphans`, keeping the rows of a list of owners.
    pub delete_orphans_except: Vec<Template>,
}

impl TableTemplates {
    pub fn orphans(&self, levels: usize) -> &Template {
        &self.delete_orphans[levels]
    }

    pub fn orphans_except(&self, levels: usize) -> Option<&Template> {
        levels
            .checked_sub(1)
            .and_then(|index| self.delete_orphans_except.get(index))
    }
}

impl SideTemplates {
    pub fn orphans(&self, levels: usize) -> Option<&Template> {
        levels
            .checked_sub(1)
            .and_then(|index| self.delete_orphans.get(index))
    }

    pub fn orphans_except(&self, levels: usize) -> Option<&Template> {
        levels
            .checked_sub(1)
            .and_then(|index| self.delete_orphans_except.get(index))
    }
}

impl Templates {
    pub fn table(&self, id: TableId) -> &TableTemplates {
        &self.tables[id.0]
    }

    pub fn side(&self, id: SideId) -> &SideTemplates {
        &self.sides[id.0]
    }
}

use crate::stmt::Scalar;

use indexmap::IndexSet;
use std::{collections::BTreeSet, hash::Hash};

/// Converts between a field's in-memory representation of its children and
/// the list of child entities the engine works with.
///
/// `Option<C>` and `Option<Box<C>>` back single-entity fields, `Vec<C>` backs
/// entity lists.
pub trait EntityCollection<C>: Send + Sync + 'static {
    /// True when the field holds at most one child.
    const SINGULAR: bool;

    fn items(&self) -> Vec<&C>;

    fn items_mut(&mut self) -> Vec<&mut C>;

    fn from_items(items: Vec<C>) -> Self;
}

impl<C: Send + Sync + 'static> EntityCollection<C> for Vec<C> {
    const SINGULAR: bool = false;

    fn items(&self) -> Vec<&C> {
        self.iter().collect()
    }

    fn items_mut(&mut self) -> Vec<&mut C> {
        self.iter_mut().collect()
    }

    fn from_items(items: Vec<C>) -> Self {
        items
    }
}

impl<C: Send + Sync + 'static> EntityCollection<C> for Option<C> {
    const SINGULAR: bool = true;

    fn items(&self) -> Vec<&C> {
        self.iter().collect()
    }

    fn items_mut(&mut self) -> Vec<&mut C> {
        self.iter_mut().collect()
    }

    fn from_items(items: Vec<C>) -> Self {
        items.into_iter().next()
    }
}

impl<C: Send + Sync + 'static> EntityCollection<C> for Option<Box<C>> {
    const SINGULAR: bool = true;

    fn items(&self) -> Vec<&C> {
        self.iter().map(|item| &**item).collect()
    }

    fn items_mut(&mut self) -> Vec<&mut C> {
        self.iter_mut().map(|item| &mut **item).collect()
    }

    fn from_items(items: Vec<C>) -> Self {
        items.into_iter().next().map(Box::new)
    }
}

/// In-memory representation of a side-table field's values.
pub trait ValueCollection<K: Scalar>: Send + Sync + 'static {
    fn values(&self) -> Vec<&K>;

    fn from_values(values: Vec<K>) -> Self;
}

impl<K: Scalar> ValueCollection<K> for Vec<K> {
    fn values(&self) -> Vec<&K> {
        self.iter().collect()
    }

    fn from_values(values: Vec<K>) -> Self {
        values
    }
}

impl<K: Scalar + Ord> ValueCollection<K> for BTreeSet<K> {
    fn values(&self) -> Vec<&K> {
        self.iter().collect()
    }

    fn from_values(values: Vec<K>) -> Self {
        values.into_iter().collect()
    }
}

impl<K: Scalar + Hash + Eq> ValueCollection<K> for IndexSet<K> {
    fn values(&self) -> Vec<&K> {
        self.iter().collect()
    }

    fn from_values(values: Vec<K>) -> Self {
        values.into_iter().collect()
    }
}

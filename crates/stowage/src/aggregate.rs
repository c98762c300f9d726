use stowage_core::schema::Blueprint;
use stowage_sql::Templates;

use std::{fmt, marker::PhantomData, sync::Arc};

/// A registered aggregate whose root entity is `T`.
///
/// Holds the blueprint and the templates derived from it. Cloning is cheap
/// and clones share both.
pub struct Aggregate<T> {
    pub(crate) inner: Arc<AggregateInner>,
    _p: PhantomData<fn() -> T>,
}

pub(crate) struct AggregateInner {
    pub(crate) blueprint: Blueprint,
    pub(crate) templates: Templates,
}

impl<T> Aggregate<T> {
    pub(crate) fn new(blueprint: Blueprint, templates: Templates) -> Self {
        Self {
            inner: Arc::new(AggregateInner {
                blueprint,
                templates,
            }),
            _p: PhantomData,
        }
    }

    /// Name of the root entity
    pub fn name(&self) -> &str {
        &self.inner.blueprint.root().name
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.inner.blueprint
    }

    pub fn templates(&self) -> &Templates {
        &self.inner.templates
    }
}

impl<T> Clone for Aggregate<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _p: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Aggregate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("name", &self.name())
            .field("tables", &self.inner.blueprint.tables.len())
            .finish()
    }
}

use super::{access::downcast, Constructor, Instance};
use crate::{stmt::Value, Error, Result};

use std::{fmt, marker::PhantomData, sync::Arc};

/// Names one concrete variant of a polymorphic entity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantTag(Arc<str>);

impl VariantTag {
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for VariantTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariantTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VariantTag {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

/// The column values of one result row, as seen by a discriminator.
///
/// Cells of joined tables whose row is absent are not part of the view.
#[derive(Debug, Default)]
pub struct RowView<'a> {
    cells: Vec<RowCell<'a>>,
}

#[derive(Debug)]
struct RowCell<'a> {
    table: &'a str,
    column: &'a str,
    value: &'a Value,
}

impl<'a> RowView<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: &'a str, column: &'a str, value: &'a Value) {
        self.cells.push(RowCell {
            table,
            column,
            value,
        });
    }

    /// Value of the first cell named `column`; main table columns come first.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.cells
            .iter()
            .find(|cell| cell.column == column)
            .map(|cell| cell.value)
    }

    /// True if the row carries a (non-absent) row of `table`.
    pub fn has_table(&self, table: &str) -> bool {
        self.cells.iter().any(|cell| cell.table == table)
    }
}

impl fmt::Display for RowView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", cell.column, cell.value)?;
        }
        Ok(())
    }
}

type ResolveFn = dyn Fn(&RowView<'_>) -> Option<VariantTag> + Send + Sync;
pub(crate) type TagOfFn = dyn Fn(&Instance) -> Result<VariantTag> + Send + Sync;

/// Declares how the concrete variant of a polymorphic entity is chosen.
///
/// Reading picks a variant from the row; writing asks the entity which
/// variant it is.
pub struct Discriminator<T> {
    pub(crate) parts: DiscriminatorParts,
    _p: PhantomData<fn(T)>,
}

pub(crate) struct DiscriminatorParts {
    pub(crate) source: DiscriminatorSource,
    pub(crate) tag_of: Arc<TagOfFn>,
    pub(crate) variants: Vec<(VariantTag, Constructor)>,
}

pub(crate) enum DiscriminatorSource {
    Column(String),
    JoinedTable,
    Custom(Arc<ResolveFn>),
}

impl<T: Send + Sync + 'static> Discriminator<T> {
    /// The variant tag is stored as text in `column` of the main table.
    pub fn by_column<F, R>(column: impl Into<String>, tag_of: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: Into<VariantTag>,
    {
        Self::with_source(DiscriminatorSource::Column(column.into()), tag_of)
    }

    /// The variant is the one whose joined table has a row.
    pub fn by_joined_table<F, R>(tag_of: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: Into<VariantTag>,
    {
        Self::with_source(DiscriminatorSource::JoinedTable, tag_of)
    }

    /// The variant is computed from the row by `resolve`.
    pub fn custom<P, F, R>(resolve: P, tag_of: F) -> Self
    where
        P: Fn(&RowView<'_>) -> Option<VariantTag> + Send + Sync + 'static,
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: Into<VariantTag>,
    {
        Self::with_source(DiscriminatorSource::Custom(Arc::new(resolve)), tag_of)
    }

    fn with_source<F, R>(source: DiscriminatorSource, tag_of: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: Into<VariantTag>,
    {
        Self {
            parts: DiscriminatorParts {
                source,
                tag_of: Arc::new(move |instance| Ok(tag_of(downcast::<T>(instance)?).into())),
                variants: vec![],
            },
            _p: PhantomData,
        }
    }

    /// Declares a variant and how to construct it before its fields are set.
    pub fn variant(
        mut self,
        tag: impl Into<VariantTag>,
        construct: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let construct: Constructor = Arc::new(move || -> Box<Instance> { Box::new(construct()) });
        self.parts.variants.push((tag.into(), construct));
        self
    }
}

/// A variant of a polymorphic entity.
pub struct VariantBlueprint {
    pub tag: VariantTag,
    construct: Constructor,
}

impl VariantBlueprint {
    pub fn construct(&self) -> Box<Instance> {
        (self.construct)()
    }
}

impl fmt::Debug for VariantBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantBlueprint").field("tag", &self.tag).finish()
    }
}

pub enum Resolve {
    /// Tag stored in a main table column
    Column(String),

    /// Variant whose joined table (by name) is present in the row
    JoinedTables(Vec<(VariantTag, String)>),

    Custom(Arc<ResolveFn>),
}

impl fmt::Debug for Resolve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolve::Column(column) => f.debug_tuple("Column").field(column).finish(),
            Resolve::JoinedTables(tables) => f.debug_tuple("JoinedTables").field(tables).finish(),
            Resolve::Custom(_) => f.write_str("Custom"),
        }
    }
}

pub struct DiscriminatorBlueprint {
    pub resolve: Resolve,
    pub variants: Vec<VariantBlueprint>,
    tag_of: Arc<TagOfFn>,
}

impl DiscriminatorBlueprint {
    pub(crate) fn new(
        resolve: Resolve,
        variants: Vec<(VariantTag, Constructor)>,
        tag_of: Arc<TagOfFn>,
    ) -> Self {
        Self {
            resolve,
            variants: variants
                .into_iter()
                .map(|(tag, construct)| VariantBlueprint { tag, construct })
                .collect(),
            tag_of,
        }
    }

    pub fn variant(&self, tag: &VariantTag) -> Option<&VariantBlueprint> {
        self.variants.iter().find(|variant| &variant.tag == tag)
    }

    /// The variant an in-memory entity currently is.
    pub fn tag_of(&self, instance: &Instance) -> Result<VariantTag> {
        (self.tag_of)(instance)
    }

    /// Picks the variant a row describes.
    pub fn resolve(&self, entity: &str, row: &RowView<'_>) -> Result<&VariantBlueprint> {
        let tag = match &self.resolve {
            Resolve::Column(column) => row
                .get(column)
                .and_then(Value::as_str)
                .map(VariantTag::new),
            Resolve::JoinedTables(tables) => {
                let present = tables
                    .iter()
                    .find(|(_, table)| row.has_table(table))
                    .map(|(tag, _)| tag.clone());

                // A variant without a joined table of its own is the fallback
                // when no variant table is present.
                present.or_else(|| {
                    let mut bare = self
                        .variants
                        .iter()
                        .filter(|variant| tables.iter().all(|(tag, _)| tag != &variant.tag));
                    match (bare.next(), bare.next()) {
                        (Some(variant), None) => Some(variant.tag.clone()),
                        _ => None,
                    }
                })
            }
            Resolve::Custom(resolve) => resolve(row),
        };

        tag.as_ref()
            .and_then(|tag| self.variant(tag))
            .ok_or_else(|| Error::unknown_variant(entity, row.to_string()))
    }
}

impl fmt::Debug for DiscriminatorBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscriminatorBlueprint")
            .field("resolve", &self.resolve)
            .field("variants", &self.variants)
            .finish()
    }
}

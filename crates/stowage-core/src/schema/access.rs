use super::EntityCollection;
use crate::{err, stmt::Value, Result};

use std::{any::Any, fmt, marker::PhantomData, sync::Arc};

/// A type-erased entity instance.
pub type Instance = dyn Any + Send + Sync;

/// Builds a fresh instance of an entity (or of one of its variants).
pub type Constructor = Arc<dyn Fn() -> Box<Instance> + Send + Sync>;

type GetFn = dyn Fn(&Instance) -> Result<Vec<Value>> + Send + Sync;
type SetFn = dyn Fn(&mut Instance, Vec<Value>) -> Result<()> + Send + Sync;

pub(crate) fn downcast<T: 'static>(instance: &Instance) -> Result<&T> {
    instance
        .downcast_ref::<T>()
        .ok_or_else(|| err!("instance is not a `{}`", std::any::type_name::<T>()))
}

pub(crate) fn downcast_mut<T: 'static>(instance: &mut Instance) -> Result<&mut T> {
    instance
        .downcast_mut::<T>()
        .ok_or_else(|| err!("instance is not a `{}`", std::any::type_name::<T>()))
}

/// Reads and writes the values behind a column-backed or side-table field.
///
/// Primitive fields exchange in-memory values (converted by the registry on
/// the way to and from the store); custom mappers exchange storage values
/// directly. Side-table fields exchange one value per collection element.
#[derive(Clone)]
pub struct ValueAccess {
    get: Arc<GetFn>,
    set: Arc<SetFn>,
}

impl ValueAccess {
    pub(crate) fn new<T, G, S>(get: G, set: S) -> Self
    where
        T: Send + Sync + 'static,
        G: Fn(&T) -> Result<Vec<Value>> + Send + Sync + 'static,
        S: Fn(&mut T, Vec<Value>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(move |instance| get(downcast::<T>(instance)?)),
            set: Arc::new(move |instance, values| set(downcast_mut::<T>(instance)?, values)),
        }
    }

    pub fn get(&self, instance: &Instance) -> Result<Vec<Value>> {
        (self.get)(instance)
    }

    pub fn set(&self, instance: &mut Instance, values: Vec<Value>) -> Result<()> {
        (self.set)(instance, values)
    }
}

impl fmt::Debug for ValueAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueAccess")
    }
}

/// Moves child entities in and out of the field that owns them.
pub trait ChildAccess: Send + Sync + 'static {
    fn items<'a>(&self, owner: &'a Instance) -> Result<Vec<&'a Instance>>;

    fn items_mut<'a>(&self, owner: &'a mut Instance) -> Result<Vec<&'a mut Instance>>;

    /// Replaces the field's contents with `items`, in order.
    fn assign(&self, owner: &mut Instance, items: Vec<Box<Instance>>) -> Result<()>;
}

pub(crate) struct Children<T, C, L, G, M> {
    get: G,
    get_mut: M,
    _p: PhantomData<fn() -> (T, C, L)>,
}

impl<T, C, L, G, M> Children<T, C, L, G, M>
where
    G: Fn(&T) -> &L,
    M: Fn(&mut T) -> &mut L,
{
    pub(crate) fn new(get: G, get_mut: M) -> Self {
        Self {
            get,
            get_mut,
            _p: PhantomData,
        }
    }
}

impl<T, C, L, G, M> ChildAccess for Children<T, C, L, G, M>
where
    T: Send + Sync + 'static,
    C: Send + Sync + 'static,
    L: EntityCollection<C>,
    G: Fn(&T) -> &L + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut L + Send + Sync + 'static,
{
    fn items<'a>(&self, owner: &'a Instance) -> Result<Vec<&'a Instance>> {
        let owner = downcast::<T>(owner)?;
        Ok((self.get)(owner)
            .items()
            .into_iter()
            .map(|item| item as &Instance)
            .collect())
    }

    fn items_mut<'a>(&self, owner: &'a mut Instance) -> Result<Vec<&'a mut Instance>> {
        let owner = downcast_mut::<T>(owner)?;
        Ok((self.get_mut)(owner)
            .items_mut()
            .into_iter()
            .map(|item| item as &mut Instance)
            .collect())
    }

    fn assign(&self, owner: &mut Instance, items: Vec<Box<Instance>>) -> Result<()> {
        let owner = downcast_mut::<T>(owner)?;
        let mut typed = Vec::with_capacity(items.len());

        for item in items {
            let item = item
                .downcast::<C>()
                .map_err(|_| err!("child is not a `{}`", std::any::type_name::<C>()))?;
            typed.push(*item);
        }

        *(self.get_mut)(owner) = L::from_items(typed);
        Ok(())
    }
}

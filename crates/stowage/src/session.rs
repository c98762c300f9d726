use crate::{
    engine::{Engine, Tracked},
    Aggregate, Stowage,
};

use stowage_core::{
    driver::Connection,
    err,
    schema::Instance,
    stmt::{TableValue, Value},
    Error, Result,
};

use tracing::instrument;

/// A unit of work: one connection plus the last-known persisted state of
/// every row read or written through it.
///
/// Saving an aggregate that was fetched in the same session only writes the
/// rows that changed, and version-checked rows that were modified elsewhere
/// since they were read are reported as conflicts.
#[derive(Debug)]
pub struct Session {
    stowage: Stowage,
    connection: Box<dyn Connection>,
    tracked: Tracked,
}

impl Session {
    pub(crate) fn new(stowage: Stowage, connection: Box<dyn Connection>) -> Self {
        Self {
            stowage,
            connection,
            tracked: Tracked::default(),
        }
    }

    fn engine<'a, T>(&'a mut self, aggregate: &'a Aggregate<T>) -> Engine<'a> {
        Engine {
            blueprint: &aggregate.inner.blueprint,
            templates: &aggregate.inner.templates,
            converters: &self.stowage.shared.converters,
            dialect: self.stowage.dialect(),
            connection: self.connection.as_mut(),
            tracked: &mut self.tracked,
        }
    }

    /// Loads the aggregates with the given root keys. Keys with no row are
    /// skipped; aggregates come back in root key order.
    #[instrument(skip_all, fields(aggregate = %aggregate.name()))]
    pub async fn fetch_by_ids<T, I>(&mut self, aggregate: &Aggregate<T>, ids: I) -> Result<Vec<T>>
    where
        T: Send + Sync + 'static,
        I: IntoIterator,
        I::Item: Into<TableValue>,
    {
        let mut engine = self.engine(aggregate);
        let ids = ids
            .into_iter()
            .map(|id| engine.root_key_to_db(id.into()))
            .collect::<Result<Vec<_>>>()?;

        let instances = engine.fetch(ids).await?;
        instances.into_iter().map(downcast).collect()
    }

    pub async fn fetch_by_id<T>(
        &mut self,
        aggregate: &Aggregate<T>,
        id: impl Into<TableValue>,
    ) -> Result<Option<T>>
    where
        T: Send + Sync + 'static,
    {
        let mut found = self.fetch_by_ids(aggregate, [id.into()]).await?;
        Ok(found.pop())
    }

    /// As [`fetch_by_id`](Self::fetch_by_id), failing when the aggregate does
    /// not exist.
    pub async fn get_by_id<T>(
        &mut self,
        aggregate: &Aggregate<T>,
        id: impl Into<TableValue>,
    ) -> Result<T>
    where
        T: Send + Sync + 'static,
    {
        let id = id.into();
        let table = &aggregate.blueprint().root_table().name;

        self.fetch_by_id(aggregate, id.clone())
            .await?
            .ok_or_else(|| Error::record_not_found(format!("table={table} key={id}")))
    }

    /// Loads the aggregates whose root row matches `clause`.
    ///
    /// The clause is appended to the root table's select as a `WHERE`
    /// clause. It may quote identifiers as `[name]` and bind `params` as `?`.
    #[instrument(skip_all, fields(aggregate = %aggregate.name()))]
    pub async fn fetch_where<T>(
        &mut self,
        aggregate: &Aggregate<T>,
        clause: &str,
        params: Vec<Value>,
    ) -> Result<Vec<T>>
    where
        T: Send + Sync + 'static,
    {
        let mut engine = self.engine(aggregate);
        let ids = engine.root_ids(clause, params).await?;
        let instances = engine.fetch(ids).await?;
        instances.into_iter().map(downcast).collect()
    }

    /// Inserts or updates every row of the aggregate and deletes the rows it
    /// no longer has.
    ///
    /// Generated keys and incremented versions are written back into
    /// `entity`.
    #[instrument(skip_all, fields(aggregate = %aggregate.name()))]
    pub async fn save<T>(&mut self, aggregate: &Aggregate<T>, entity: &mut T) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        let name = aggregate.name().to_string();

        self.engine(aggregate)
            .save(entity)
            .await
            .map_err(|err| err.context(err!("save `{name}` failed")))
    }

    /// Deletes the aggregate rooted at `entity`.
    #[instrument(skip_all, fields(aggregate = %aggregate.name()))]
    pub async fn delete<T>(&mut self, aggregate: &Aggregate<T>, entity: &T) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        let mut engine = self.engine(aggregate);
        let key = engine.root_key_of(entity)?;
        engine.delete_roots(vec![key]).await?;
        Ok(())
    }

    pub async fn delete_by_id<T>(
        &mut self,
        aggregate: &Aggregate<T>,
        id: impl Into<TableValue>,
    ) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        self.delete_by_ids(aggregate, [id.into()]).await?;
        Ok(())
    }

    /// Deletes the aggregates with the given root keys without loading them.
    /// Returns the number of root rows removed.
    #[instrument(skip_all, fields(aggregate = %aggregate.name()))]
    pub async fn delete_by_ids<T, I>(&mut self, aggregate: &Aggregate<T>, ids: I) -> Result<u64>
    where
        T: Send + Sync + 'static,
        I: IntoIterator,
        I::Item: Into<TableValue>,
    {
        let mut engine = self.engine(aggregate);
        let ids = ids
            .into_iter()
            .map(|id| engine.root_key_to_db(id.into()))
            .collect::<Result<Vec<_>>>()?;

        engine.delete_roots(ids).await
    }

    /// Number of rows whose persisted state the session currently knows.
    pub fn tracked_rows(&self) -> usize {
        self.tracked.len()
    }

    /// Forgets all tracked state; the next save of any aggregate writes every
    /// row.
    pub fn clear_tracked(&mut self) {
        self.tracked.clear();
    }

    /// The underlying connection, for statements outside any aggregate.
    pub fn connection_mut(&mut self) -> &mut dyn Connection {
        self.connection.as_mut()
    }

    pub fn into_connection(self) -> Box<dyn Connection> {
        self.connection
    }
}

fn downcast<T: Send + Sync + 'static>(instance: Box<Instance>) -> Result<T> {
    instance
        .downcast::<T>()
        .map(|instance| *instance)
        .map_err(|_| err!("fetched instance is not a `{}`", std::any::type_name::<T>()))
}

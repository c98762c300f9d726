mod builder;
pub use builder::Builder;

mod config;
pub use config::Config;

use crate::{Aggregate, Session};

use stowage_core::{
    convert::ConverterRegistry,
    driver::Connection,
    schema::{self, EntityDef},
    Result,
};
use stowage_sql::Dialect;

use std::sync::Arc;

/// Entry point: settings shared by every aggregate and session.
///
/// Cloning is cheap; clones share the same settings.
#[derive(Debug, Clone)]
pub struct Stowage {
    pub(crate) shared: Arc<Shared>,
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) converters: ConverterRegistry,
}

impl Stowage {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Builds the blueprint of an aggregate, validates it and derives its
    /// templates. A rejected blueprint is never made available.
    pub fn register<T>(&self, def: EntityDef<T>) -> Result<Aggregate<T>>
    where
        T: Send + Sync + 'static,
    {
        let mut builder = schema::Builder::new();

        if let Some(prefix) = &self.shared.config.table_name_prefix {
            builder.table_name_prefix(prefix);
        }

        let blueprint = builder.build(def)?;
        let templates = stowage_sql::build(&blueprint);

        tracing::debug!(
            aggregate = %blueprint.root().name,
            entities = blueprint.entities.len(),
            tables = blueprint.tables.len(),
            "registered aggregate"
        );

        Ok(Aggregate::new(blueprint, templates))
    }

    /// Opens a unit of work over `connection`.
    pub fn session(&self, connection: impl Connection) -> Session {
        Session::new(self.clone(), Box::new(connection))
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn dialect(&self) -> Dialect {
        self.shared.config.dialect
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.shared.converters
    }
}

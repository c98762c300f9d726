use super::{Config, Shared, Stowage};

use stowage_core::convert::ConverterRegistry;
use stowage_sql::Dialect;

use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Builder {
    config: Config,

    /// Converters handed to every session; the built-in set when unset
    converters: Option<ConverterRegistry>,
}

impl Builder {
    /// Replaces every setting with `config`.
    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    pub fn dialect(&mut self, dialect: Dialect) -> &mut Self {
        self.config.dialect = dialect;
        self
    }

    /// Set the table name prefix for all tables
    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.config.table_name_prefix = Some(prefix.to_string());
        self
    }

    pub fn converters(&mut self, converters: ConverterRegistry) -> &mut Self {
        self.converters = Some(converters);
        self
    }

    pub fn build(&mut self) -> Stowage {
        Stowage {
            shared: Arc::new(Shared {
                config: self.config.clone(),
                converters: self.converters.clone().unwrap_or_default(),
            }),
        }
    }
}

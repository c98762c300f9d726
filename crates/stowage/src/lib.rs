mod aggregate;
pub use aggregate::Aggregate;

pub mod db;
pub use db::{Config, Stowage};

mod engine;

mod session;
pub use session::Session;

pub use stowage_core::{
    bail,
    convert::{self, Converter, ConverterRegistry},
    driver::{self, Connection},
    err,
    schema::{
        self, CustomMapper, Discriminator, EntityDef, Field, JoinKind, RowView, SideTableDef,
        TableDef, VariantTag,
    },
    stmt::{self, Direction, ScalarType, TableValue, Value},
    Error, Result,
};
pub use stowage_sql::Dialect;

pub mod convert;
pub use convert::{Converter, ConverterRegistry};

pub mod driver;
pub use driver::Connection;

mod error;
pub use error::{Error, IntoError, StatementKind};

pub mod schema;
pub use schema::Blueprint;

pub mod stmt;

/// A Result type alias that uses Stowage's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;

mod delete;
mod exec;
mod populate;
mod row;
mod save;

mod tracked;
pub(crate) use tracked::Tracked;

use stowage_core::{convert::ConverterRegistry, driver::Connection, schema::Blueprint};
use stowage_sql::{Dialect, Templates};

/// Everything one operation on one aggregate works with.
///
/// Borrowed from a [`Session`](crate::Session) for the duration of a call.
/// Statements run one at a time, each awaited before the next is issued.
pub(crate) struct Engine<'a> {
    pub(crate) blueprint: &'a Blueprint,
    pub(crate) templates: &'a Templates,
    pub(crate) converters: &'a ConverterRegistry,
    pub(crate) dialect: Dialect,
    pub(crate) connection: &'a mut dyn Connection,
    pub(crate) tracked: &'a mut Tracked,
}

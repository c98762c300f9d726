#[macro_use]
mod fmt;
use fmt::{Column, Comma, Conjunction, Formatter, Ident, List, Param, ToSql, Tuple};

mod builder;
pub use builder::build;

mod dialect;
pub use dialect::Dialect;

mod template;
pub use template::Template;

mod templates;
pub use templates::{SideTemplates, TableTemplates, Target, Templates};

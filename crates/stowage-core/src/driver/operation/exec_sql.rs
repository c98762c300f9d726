use super::Operation;

use crate::stmt::Value;

#[derive(Debug, Clone)]
pub struct ExecSql {
    /// The rendered SQL statement
    pub sql: String,

    /// Positional parameters, already in their storage representation
    pub params: Vec<Value>,

    /// When set, the driver reports the key generated by an `INSERT` into a
    /// table with an auto-increment primary key.
    pub returning_key: bool,
}

impl From<ExecSql> for Operation {
    fn from(value: ExecSql) -> Self {
        Self::ExecSql(value)
    }
}

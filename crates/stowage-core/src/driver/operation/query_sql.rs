use super::Operation;

use crate::stmt::Value;

#[derive(Debug, Clone)]
pub struct QuerySql {
    /// The rendered SQL query
    pub sql: String,

    /// Positional parameters, already in their storage representation
    pub params: Vec<Value>,
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}

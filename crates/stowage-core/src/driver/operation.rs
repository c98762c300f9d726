mod exec_sql;
pub use exec_sql::ExecSql;

mod query_sql;
pub use query_sql::QuerySql;

use crate::stmt::Value;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Run a statement that returns rows
    QuerySql(QuerySql),

    /// Run a statement that modifies rows and reports how many
    ExecSql(ExecSql),
}

impl Operation {
    pub fn sql(&self) -> &str {
        match self {
            Operation::QuerySql(op) => &op.sql,
            Operation::ExecSql(op) => &op.sql,
        }
    }

    pub fn params(&self) -> &[Value] {
        match self {
            Operation::QuerySql(op) => &op.params,
            Operation::ExecSql(op) => &op.params,
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Operation::QuerySql(_))
    }
}

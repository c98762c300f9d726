mod exec_log;
pub use exec_log::ExecLog;

pub mod fixtures;

mod logging_connection;
pub use logging_connection::{DriverOp, LoggingConnection};

use stowage::{driver::operation::ExecSql, Connection, Session, Stowage, Value};
use stowage_driver_sqlite::Sqlite;

/// Installs a fmt subscriber filtered by `RUST_LOG`. Safe to call from every
/// test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Opens a session over a fresh in-memory SQLite database after running
/// `ddl` on it. The returned log only sees the session's statements.
pub async fn setup(stowage: &Stowage, ddl: &[&str]) -> (Session, ExecLog) {
    init_tracing();

    let mut connection = Sqlite::in_memory().connect().unwrap();

    for sql in ddl {
        connection.exec(statement(sql, vec![])).await.unwrap();
    }

    let connection = LoggingConnection::new(Box::new(connection));
    let log = ExecLog::new(connection.ops_log_handle());

    (stowage.session(connection), log)
}

/// A write issued outside any aggregate, e.g. to simulate another writer.
pub fn statement(sql: &str, params: Vec<Value>) -> stowage::driver::Operation {
    ExecSql {
        sql: sql.to_string(),
        params,
        returning_key: false,
    }
    .into()
}

/// Runs `sql` on the session's connection and returns the affected rows.
pub async fn exec_raw(session: &mut Session, sql: &str, params: Vec<Value>) -> u64 {
    session
        .connection_mut()
        .exec(statement(sql, params))
        .await
        .unwrap()
        .rows
        .count()
}

/// Runs a query on the session's connection and returns its rows.
pub async fn query_raw(session: &mut Session, sql: &str, params: Vec<Value>) -> Vec<Vec<Value>> {
    let op = stowage::driver::operation::QuerySql {
        sql: sql.to_string(),
        params,
    };

    session
        .connection_mut()
        .exec(op.into())
        .await
        .unwrap()
        .rows
        .into_values()
        .unwrap()
        .into_iter()
        .map(|record| record.into_vec())
        .collect()
}

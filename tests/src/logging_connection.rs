use std::sync::{Arc, Mutex};
use stowage_core::{
    async_trait,
    driver::{Connection, Operation, Response},
    Result,
};

#[derive(Debug, Clone)]
pub struct DriverOp {
    pub operation: Operation,

    /// Rows affected by a write, or rows returned by a query
    pub count: u64,
}

/// A connection wrapper that logs all operations for testing purposes
#[derive(Debug)]
pub struct LoggingConnection {
    /// The underlying connection that actually executes operations
    inner: Box<dyn Connection>,

    /// Log of all operations executed through this connection, shared with
    /// the test holding an [`ExecLog`](crate::ExecLog)
    ops_log: Arc<Mutex<Vec<DriverOp>>>,
}

impl LoggingConnection {
    pub fn new(inner: Box<dyn Connection>) -> Self {
        Self {
            inner,
            ops_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a handle to access the operations log
    pub fn ops_log_handle(&self) -> Arc<Mutex<Vec<DriverOp>>> {
        self.ops_log.clone()
    }
}

#[async_trait]
impl Connection for LoggingConnection {
    async fn exec(&mut self, operation: Operation) -> Result<Response> {
        let logged = operation.clone();
        let response = self.inner.exec(operation).await?;

        self.ops_log
            .lock()
            .expect("Failed to acquire ops log lock")
            .push(DriverOp {
                operation: logged,
                count: response.rows.count(),
            });

        Ok(response)
    }
}

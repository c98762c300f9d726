use crate::logging_connection::DriverOp;
use std::sync::{Arc, Mutex};
use stowage_core::driver::Operation;

/// A wrapper around the operations log that provides a clean API for tests
#[derive(Debug, Clone)]
pub struct ExecLog {
    ops: Arc<Mutex<Vec<DriverOp>>>,
}

impl ExecLog {
    pub(crate) fn new(ops: Arc<Mutex<Vec<DriverOp>>>) -> Self {
        Self { ops }
    }

    /// Get the number of logged operations
    pub fn len(&self) -> usize {
        self.ops.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.lock().unwrap().is_empty()
    }

    /// Count operations matching the given predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Operation) -> bool,
    {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| predicate(&op.operation))
            .count()
    }

    /// Number of statements whose SQL starts with `keyword`
    pub fn statements(&self, keyword: &str) -> usize {
        self.count(|op| op.sql().starts_with(keyword))
    }

    /// Rows affected by the statements whose SQL starts with `keyword`
    pub fn affected(&self, keyword: &str) -> u64 {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|op| op.operation.sql().starts_with(keyword))
            .map(|op| op.count)
            .sum()
    }

    /// Number of operations that modified the store
    pub fn writes(&self) -> usize {
        self.count(|op| !op.is_query())
    }

    /// The SQL of every logged operation, in order
    pub fn sql(&self) -> Vec<String> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .map(|op| op.operation.sql().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// Remove and return the first operation from the log
    pub fn pop(&self) -> Option<DriverOp> {
        let mut ops = self.ops.lock().unwrap();
        if ops.is_empty() {
            None
        } else {
            Some(ops.remove(0))
        }
    }
}

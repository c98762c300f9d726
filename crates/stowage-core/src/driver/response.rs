use crate::stmt::{Value, ValueRecord};

#[derive(Debug)]
pub struct Response {
    pub rows: Rows,

    /// Key generated by the statement, when one was requested
    pub generated_key: Option<Value>,
}

#[derive(Debug)]
pub enum Rows {
    /// Number of rows impacted by the operation
    Count(u64),

    /// Operation result, one record per row
    Values(Vec<ValueRecord>),
}

impl Response {
    pub fn count(count: u64) -> Self {
        Self {
            rows: Rows::Count(count),
            generated_key: None,
        }
    }

    pub fn values(records: Vec<ValueRecord>) -> Self {
        Self {
            rows: Rows::Values(records),
            generated_key: None,
        }
    }

    pub fn with_generated_key(mut self, key: Value) -> Self {
        self.generated_key = Some(key);
        self
    }
}

impl Rows {
    /// Affected rows for a count response; the row count otherwise.
    pub fn count(&self) -> u64 {
        match self {
            Rows::Count(count) => *count,
            Rows::Values(records) => records.len() as u64,
        }
    }

    pub fn into_values(self) -> crate::Result<Vec<ValueRecord>> {
        match self {
            Rows::Values(records) => Ok(records),
            Rows::Count(count) => crate::bail!("expected rows, driver reported {count} affected"),
        }
    }
}

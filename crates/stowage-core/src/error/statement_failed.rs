use super::Error;

/// The kind of statement that was executing when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Context attached to a driver error, naming the statement and table that
/// failed.
#[derive(Debug)]
pub(super) struct StatementFailed {
    kind: StatementKind,
    table: Box<str>,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
        }
    }
}

impl core::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for StatementFailed {}

impl core::fmt::Display for StatementFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{} `{}` failed", self.kind, self.table)
    }
}

impl Error {
    /// Creates the context error wrapped around a failed statement.
    ///
    /// Used as `err.context(Error::statement_failed(kind, table))`.
    pub fn statement_failed(kind: StatementKind, table: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::StatementFailed(StatementFailed {
            kind,
            table: table.into().into(),
        }))
    }

    /// Returns `true` if this error was raised by a failing statement.
    pub fn is_statement_failed(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::StatementFailed(_)))
    }
}

use super::Error;

/// Error when a version-checked update affects no rows even though the row
/// was previously read in the same unit of work.
///
/// The row was either changed by someone else (the stored version moved on)
/// or deleted since it was read.
#[derive(Debug)]
pub(super) struct ConcurrencyConflict {
    table: Box<str>,
    key: Box<str>,
}

impl std::error::Error for ConcurrencyConflict {}

impl core::fmt::Display for ConcurrencyConflict {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "concurrency conflict: `{}` row {} was modified or removed since it was read",
            self.table, self.key
        )
    }
}

impl Error {
    /// Creates an optimistic concurrency error for the row identified by `key`
    /// in `table`.
    pub fn concurrency_conflict(table: impl Into<String>, key: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ConcurrencyConflict(ConcurrencyConflict {
            table: table.into().into(),
            key: key.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a concurrency
    /// conflict.
    pub fn is_concurrency_conflict(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::ConcurrencyConflict(_)))
    }
}

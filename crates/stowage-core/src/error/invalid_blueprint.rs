use super::Error;

/// Error when an aggregate's declarative mapping cannot be turned into a
/// blueprint.
///
/// This occurs when:
/// - A side-table field is missing its table, key column or join column
/// - A field is declared both as a custom mapper and as a structural field
/// - A column is auto-increment without being the primary key
/// - A declared parent table does not name an ancestor table
///
/// These errors are raised at registration; an aggregate that fails
/// validation is never available for queries.
#[derive(Debug)]
pub(super) struct InvalidBlueprint {
    message: Box<str>,
}

impl std::error::Error for InvalidBlueprint {}

impl core::fmt::Display for InvalidBlueprint {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid blueprint: {}", self.message)
    }
}

impl Error {
    /// Creates a blueprint validation error.
    pub fn invalid_blueprint(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidBlueprint(InvalidBlueprint {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a blueprint validation error.
    pub fn is_invalid_blueprint(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::InvalidBlueprint(_)))
    }
}

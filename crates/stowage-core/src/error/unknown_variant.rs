use super::Error;

/// Error when a discriminator cannot map a row onto any declared variant.
#[derive(Debug)]
pub(super) struct UnknownVariant {
    entity: Box<str>,
    row: Box<str>,
}

impl std::error::Error for UnknownVariant {}

impl core::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "row of `{}` matches no declared variant: {}",
            self.entity, self.row
        )
    }
}

impl Error {
    /// Creates an unresolvable-discriminator error. `row` describes the
    /// discriminating column values.
    pub fn unknown_variant(entity: impl Into<String>, row: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownVariant(UnknownVariant {
            entity: entity.into().into(),
            row: row.into().into(),
        }))
    }

    /// Returns `true` if this error is an unresolvable-discriminator error.
    pub fn is_unknown_variant(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::UnknownVariant(_)))
    }
}

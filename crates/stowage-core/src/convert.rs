//! Conversion between the values drivers store and the values fields hold.

mod builtin;
pub use builtin::{BoolAsInteger, FloatFromInteger, I32FromInteger, Identity, UuidAsText};

use crate::{stmt::ScalarType, stmt::Value, Result};

use std::{collections::HashMap, fmt, sync::Arc};

/// Bidirectional conversion for one scalar type.
pub trait Converter: fmt::Debug + Send + Sync + 'static {
    /// In-memory value → value bound as a statement parameter.
    fn to_db(&self, value: Value) -> Result<Value>;

    /// Value read from a result row → in-memory value.
    fn from_db(&self, value: Value) -> Result<Value>;
}

/// Maps each [`ScalarType`] to the converter used for it.
///
/// The registry is an explicit value handed to the engine when it is built;
/// there is no process-wide registry. Types with no entry pass through
/// unchanged.
#[derive(Debug, Clone)]
pub struct ConverterRegistry {
    converters: HashMap<ScalarType, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// A registry with no conversions at all.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registers `converter` for `ty`, replacing any previous entry.
    pub fn register(&mut self, ty: ScalarType, converter: impl Converter) -> &mut Self {
        self.converters.insert(ty, Arc::new(converter));
        self
    }

    pub fn get(&self, ty: ScalarType) -> Option<&Arc<dyn Converter>> {
        self.converters.get(&ty)
    }

    /// Converts an in-memory value of type `ty` for storage. `custom`, the
    /// column's own converter, takes precedence over the registry.
    pub fn to_db(
        &self,
        ty: ScalarType,
        custom: Option<&Arc<dyn Converter>>,
        value: Value,
    ) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }

        match custom.or_else(|| self.get(ty)) {
            Some(converter) => converter.to_db(value),
            None => Ok(value),
        }
    }

    /// Converts a stored value into the in-memory representation of `ty`.
    pub fn from_db(
        &self,
        ty: ScalarType,
        custom: Option<&Arc<dyn Converter>>,
        value: Value,
    ) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }

        match custom.or_else(|| self.get(ty)) {
            Some(converter) => converter.from_db(value),
            None => Ok(value),
        }
    }
}

impl Default for ConverterRegistry {
    /// The built-in conversions: booleans stored as integers, `i32` narrowed
    /// from 64-bit integers, floats widened from integers and UUIDs stored as
    /// hyphenated text.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(ScalarType::Bool, BoolAsInteger)
            .register(ScalarType::I32, I32FromInteger)
            .register(ScalarType::F64, FloatFromInteger)
            .register(ScalarType::Uuid, UuidAsText);
        registry
    }
}

use super::Value;

/// The declared type of a column, and of the in-memory scalar a field holds.
///
/// The converter registry is keyed by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// 64-bit floating point number
    F64,

    /// String type
    String,

    /// Opaque byte array
    Bytes,

    /// 128-bit universally unique identifier
    Uuid,
}

impl ScalarType {
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::F64 => "f64",
            ScalarType::String => "String",
            ScalarType::Bytes => "bytes",
            ScalarType::Uuid => "Uuid",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ScalarType::I32 | ScalarType::I64)
    }

    /// Returns true if `value` is already in this type's in-memory
    /// representation. `Null` matches every type.
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (ScalarType::Bool, Value::Bool(_))
                | (ScalarType::I32, Value::I32(_))
                | (ScalarType::I64, Value::I64(_))
                | (ScalarType::F64, Value::F64(_))
                | (ScalarType::String, Value::String(_))
                | (ScalarType::Bytes, Value::Bytes(_))
                | (ScalarType::Uuid, Value::Uuid(_))
        )
    }
}

impl core::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

use super::{ScalarType, Value};
use crate::{Error, Result};

use uuid::Uuid;

/// A Rust type that can be stored in a single column.
///
/// `to_value`/`from_value` translate between the Rust type and its in-memory
/// [`Value`] representation. Translation to the storage representation is the
/// converter registry's job.
pub trait Scalar: Sized + Send + Sync + 'static {
    const TYPE: ScalarType;

    /// True for `Option<T>`: the column accepts null.
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

impl Scalar for bool {
    const TYPE: ScalarType = ScalarType::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            value => Err(Error::type_conversion(value, "bool")),
        }
    }
}

impl Scalar for i32 {
    const TYPE: ScalarType = ScalarType::I32;

    fn to_value(&self) -> Value {
        Value::I32(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::I32(v) => Ok(v),
            Value::I64(v) => i32::try_from(v).map_err(|_| Error::type_conversion(value, "i32")),
            value => Err(Error::type_conversion(value, "i32")),
        }
    }
}

impl Scalar for i64 {
    const TYPE: ScalarType = ScalarType::I64;

    fn to_value(&self) -> Value {
        Value::I64(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        value.to_i64()
    }
}

impl Scalar for f64 {
    const TYPE: ScalarType = ScalarType::F64;

    fn to_value(&self) -> Value {
        Value::F64(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F64(v) => Ok(v),
            value => Err(Error::type_conversion(value, "f64")),
        }
    }
}

impl Scalar for String {
    const TYPE: ScalarType = ScalarType::String;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            value => Err(Error::type_conversion(value, "String")),
        }
    }
}

impl Scalar for Vec<u8> {
    const TYPE: ScalarType = ScalarType::Bytes;

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            value => Err(Error::type_conversion(value, "Vec<u8>")),
        }
    }
}

impl Scalar for Uuid {
    const TYPE: ScalarType = ScalarType::Uuid;

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(v) => Ok(v),
            value => Err(Error::type_conversion(value, "Uuid")),
        }
    }
}

impl<T: Scalar> Scalar for Option<T> {
    const TYPE: ScalarType = T::TYPE;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

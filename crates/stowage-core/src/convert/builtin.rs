use super::Converter;
use crate::{stmt::Value, Error, Result};

use uuid::Uuid;

/// Leaves values untouched in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Converter for Identity {
    fn to_db(&self, value: Value) -> Result<Value> {
        Ok(value)
    }

    fn from_db(&self, value: Value) -> Result<Value> {
        Ok(value)
    }
}

/// Stores booleans as `0`/`1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolAsInteger;

impl Converter for BoolAsInteger {
    fn to_db(&self, value: Value) -> Result<Value> {
        match value {
            Value::Bool(v) => Ok(Value::I64(v.into())),
            value => Ok(value),
        }
    }

    fn from_db(&self, value: Value) -> Result<Value> {
        match value {
            Value::Bool(_) => Ok(value),
            Value::I32(v) => Ok(Value::Bool(v != 0)),
            Value::I64(v) => Ok(Value::Bool(v != 0)),
            value => Err(Error::type_conversion(value, "bool")),
        }
    }
}

/// Reads 32-bit integers from drivers that only report 64-bit integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct I32FromInteger;

impl Converter for I32FromInteger {
    fn to_db(&self, value: Value) -> Result<Value> {
        Ok(value)
    }

    fn from_db(&self, value: Value) -> Result<Value> {
        match value {
            Value::I32(_) => Ok(value),
            Value::I64(v) => i32::try_from(v)
                .map(Value::I32)
                .map_err(|_| Error::type_conversion(value, "i32")),
            value => Err(Error::type_conversion(value, "i32")),
        }
    }
}

/// Accepts integers where a float column holds a whole number.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatFromInteger;

impl Converter for FloatFromInteger {
    fn to_db(&self, value: Value) -> Result<Value> {
        Ok(value)
    }

    fn from_db(&self, value: Value) -> Result<Value> {
        match value {
            Value::F64(_) => Ok(value),
            Value::I32(v) => Ok(Value::F64(v.into())),
            Value::I64(v) => Ok(Value::F64(v as f64)),
            value => Err(Error::type_conversion(value, "f64")),
        }
    }
}

/// Stores UUIDs as hyphenated text; reads either text or 16-byte blobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidAsText;

impl Converter for UuidAsText {
    fn to_db(&self, value: Value) -> Result<Value> {
        match value {
            Value::Uuid(v) => Ok(Value::String(v.hyphenated().to_string())),
            value => Ok(value),
        }
    }

    fn from_db(&self, value: Value) -> Result<Value> {
        match value {
            Value::Uuid(_) => Ok(value),
            Value::String(text) => Ok(Value::Uuid(text.parse::<Uuid>()?)),
            Value::Bytes(bytes) => Ok(Value::Uuid(Uuid::from_slice(&bytes)?)),
            value => Err(Error::type_conversion(value, "Uuid")),
        }
    }
}

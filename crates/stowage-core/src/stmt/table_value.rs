use super::Value;

use std::{
    fmt,
    hash::{Hash, Hasher},
};
use uuid::Uuid;

/// Identifies one row: the values of a table's key columns, in column order.
///
/// Equality is element-wise and by content, so two keys built from separate
/// byte arrays with the same bytes are equal and hash identically. Floats
/// compare by bit pattern so the type can implement `Eq`.
#[derive(Clone, Default)]
pub struct TableValue {
    values: Vec<Value>,
}

impl TableValue {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn single(value: impl Into<Value>) -> Self {
        Self {
            values: vec![value.into()],
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if any component is null. A key with a null component does not
    /// identify a row.
    pub fn has_null(&self) -> bool {
        self.values.iter().any(Value::is_null)
    }
}

fn component_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
        _ => a == b,
    }
}

impl PartialEq for TableValue {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| component_eq(a, b))
    }
}

impl Eq for TableValue {}

impl Hash for TableValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.values.len());

        for value in &self.values {
            core::mem::discriminant(value).hash(state);

            match value {
                Value::Null => {}
                Value::Bool(v) => v.hash(state),
                Value::I32(v) => v.hash(state),
                Value::I64(v) => v.hash(state),
                Value::F64(v) => v.to_bits().hash(state),
                Value::String(v) => v.hash(state),
                Value::Bytes(v) => v.hash(state),
                Value::Uuid(v) => v.hash(state),
            }
        }
    }
}

impl fmt::Debug for TableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for TableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(value, f)?;
        }
        f.write_str(")")
    }
}

impl From<Vec<Value>> for TableValue {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl From<Value> for TableValue {
    fn from(value: Value) -> Self {
        Self::single(value)
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for TableValue {
                fn from(value: $ty) -> Self {
                    Self::single(value)
                }
            }
        )*
    };
}

impl_from_scalar!(bool, i32, i64, String, &String, &str, Vec<u8>, &[u8], Uuid);

impl<A, B> From<(A, B)> for TableValue
where
    A: Into<Value>,
    B: Into<Value>,
{
    fn from((a, b): (A, B)) -> Self {
        Self::new(vec![a.into(), b.into()])
    }
}

impl<A, B, C> From<(A, B, C)> for TableValue
where
    A: Into<Value>,
    B: Into<Value>,
    C: Into<Value>,
{
    fn from((a, b, c): (A, B, C)) -> Self {
        Self::new(vec![a.into(), b.into(), c.into()])
    }
}

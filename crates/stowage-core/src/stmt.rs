mod direction;
pub use direction::Direction;

mod scalar;
pub use scalar::Scalar;

mod table_value;
pub use table_value::TableValue;

mod ty;
pub use ty::ScalarType;

mod value;
pub use value::Value;

mod value_cmp;

mod value_record;
pub use value_record::ValueRecord;

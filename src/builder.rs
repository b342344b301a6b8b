//! Accumulates converted cells into Arrow typed builders and hands back the
//! finished array per column.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Float64Builder, Int64Builder, NullArray,
    StringBuilder,
};

use crate::convert::Value;
use crate::schema::DataType;

/// One column's in-progress Arrow array. The variant is fixed at
/// construction from the column's resolved `DataType`; every `append` call
/// after that is expected to carry a matching `Value` (the coordinator only
/// ever converts cells to the column's current resolved type).
pub enum ColumnBuilder {
    Null(usize),
    Bool(BooleanBuilder),
    Int64(Int64Builder),
    Float64(Float64Builder),
    String(StringBuilder),
    Binary(BinaryBuilder),
}

impl ColumnBuilder {
    pub fn new(data_type: DataType, capacity: usize) -> Self {
        match data_type {
            DataType::Null => ColumnBuilder::Null(0),
            DataType::Bool => ColumnBuilder::Bool(BooleanBuilder::with_capacity(capacity)),
            DataType::Int64 => ColumnBuilder::Int64(Int64Builder::with_capacity(capacity)),
            DataType::Float64 => ColumnBuilder::Float64(Float64Builder::with_capacity(capacity)),
            DataType::String => {
                ColumnBuilder::String(StringBuilder::with_capacity(capacity, capacity * 8))
            }
            DataType::Binary => {
                ColumnBuilder::Binary(BinaryBuilder::with_capacity(capacity, capacity * 8))
            }
        }
    }

    pub fn append(&mut self, value: Value) {
        match self {
            ColumnBuilder::Null(count) => match value {
                Value::Null => *count += 1,
                other => panic!("null column received non-null value {other:?}"),
            },
            ColumnBuilder::Bool(builder) => match value {
                Value::Bool(v) => builder.append_value(v),
                Value::Null => builder.append_null(),
                other => panic!("bool column received {other:?}"),
            },
            ColumnBuilder::Int64(builder) => match value {
                Value::Int64(v) => builder.append_value(v),
                Value::Null => builder.append_null(),
                other => panic!("int64 column received {other:?}"),
            },
            ColumnBuilder::Float64(builder) => match value {
                Value::Float64(v) => builder.append_value(v),
                Value::Null => builder.append_null(),
                other => panic!("float64 column received {other:?}"),
            },
            ColumnBuilder::String(builder) => match value {
                Value::String(bytes) => builder.append_value(String::from_utf8_lossy(&bytes)),
                Value::Null => builder.append_null(),
                other => panic!("string column received {other:?}"),
            },
            ColumnBuilder::Binary(builder) => match value {
                Value::String(bytes) => builder.append_value(bytes),
                Value::Null => builder.append_null(),
                other => panic!("binary column received {other:?}"),
            },
        }
    }

    pub fn finalize(self) -> ArrayRef {
        match self {
            ColumnBuilder::Null(count) => Arc::new(NullArray::new(count)),
            ColumnBuilder::Bool(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Int64(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Float64(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::String(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Binary(mut builder) => Arc::new(builder.finish()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Int64Array};

    #[test]
    fn int64_builder_tracks_nulls_and_values() {
        let mut builder = ColumnBuilder::new(DataType::Int64, 4);
        builder.append(Value::Int64(1));
        builder.append(Value::Null);
        builder.append(Value::Int64(3));
        let array = builder.finalize();
        let array = array.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(array.len(), 3);
        assert!(array.is_valid(0));
        assert!(array.is_null(1));
        assert_eq!(array.value(2), 3);
    }

    #[test]
    fn bool_builder_round_trips() {
        let mut builder = ColumnBuilder::new(DataType::Bool, 2);
        builder.append(Value::Bool(true));
        builder.append(Value::Bool(false));
        let array = builder.finalize();
        let array = array.as_any().downcast_ref::<BooleanArray>().unwrap();
        assert_eq!(array.value(0), true);
        assert_eq!(array.value(1), false);
    }

    #[test]
    fn null_column_counts_without_a_real_buffer() {
        let mut builder = ColumnBuilder::new(DataType::Null, 0);
        builder.append(Value::Null);
        builder.append(Value::Null);
        let array = builder.finalize();
        assert_eq!(array.len(), 2);
        assert_eq!(array.null_count(), 2);
    }
}

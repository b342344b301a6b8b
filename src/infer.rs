//! Type inferencer (spec §4.5): classifies each observed field into the
//! narrowest type on the NULL -> BOOL -> INT64 -> FLOAT64 -> STRING lattice
//! that can hold it, then widens the column's resolved type to cover it.
//!
//! Classification reuses `convert`'s own parse probes rather than
//! re-implementing the predicates, so a value that is judged to be, say,
//! INT64 here is guaranteed to actually convert as INT64 later.

use crate::convert::{try_parse_bool, try_parse_float64, try_parse_int64};
use crate::options::ConvertOptions;
use crate::schema::{DataType, SchemaRegistry};

pub struct TypeInferencer<'a> {
    options: &'a ConvertOptions,
}

impl<'a> TypeInferencer<'a> {
    pub fn new(options: &'a ConvertOptions) -> Self {
        Self { options }
    }

    /// The narrowest type that can hold `trimmed` on its own, ignoring any
    /// other value seen for the column. A null match returns `Null`, which
    /// is the lattice bottom and leaves a column's resolved type unchanged
    /// until a non-null value is observed.
    pub fn classify(&self, trimmed: &[u8]) -> DataType {
        if self.options.is_null(trimmed) {
            return DataType::Null;
        }
        if try_parse_bool(trimmed, self.options).is_some() {
            return DataType::Bool;
        }
        if try_parse_int64(
            trimmed,
            self.options.is_cobol,
            &self.options.pos_values,
            &self.options.neg_values,
        )
        .is_some()
        {
            return DataType::Int64;
        }
        if try_parse_float64(trimmed).is_some() {
            return DataType::Float64;
        }
        DataType::String
    }

    /// Folds one observed field into `registry`'s resolved type for
    /// `column`, unless that column has a declared (non-inferred) type.
    /// Returns whether the registry's type for `column` changed.
    pub fn observe(&self, registry: &mut SchemaRegistry, column: &str, trimmed: &[u8]) -> bool {
        let observed = self.classify(trimmed);
        registry.widen(column, observed)
    }
}

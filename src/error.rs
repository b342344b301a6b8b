use arrow::error::ArrowError;
use snafu::prelude::*;
use snafu::Location;

use crate::schema::DataType;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FwfError {
    #[snafu(display("invalid option: {}", msg))]
    InvalidOption {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("unknown encoding: {}", name))]
    UnknownEncoding {
        name: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "transcode output buffer too small (safety factor {}, block size {})",
        safety_factor,
        block_size
    ))]
    BufferTooSmall {
        safety_factor: f64,
        block_size: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "row at byte offset {} is shorter than the declared {} bytes",
        byte_offset,
        expected
    ))]
    ShortRow {
        byte_offset: u64,
        expected: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "row at byte offset {} is longer than the declared {} bytes",
        byte_offset,
        expected
    ))]
    OverlongRow {
        byte_offset: u64,
        expected: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "cannot convert row {} column '{}' ({:?}) from {:?}",
        row,
        column,
        target_type,
        value
    ))]
    ConversionError {
        row: usize,
        column: String,
        target_type: DataType,
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to read, source: {}", source))]
    IoError {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("arrow error: {}", source))]
    Arrow {
        source: ArrowError,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T, E = FwfError> = std::result::Result<T, E>;

impl From<FwfError> for ArrowError {
    fn from(value: FwfError) -> Self {
        ArrowError::ExternalError(Box::new(value))
    }
}

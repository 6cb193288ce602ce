use std::ops::Range;

use thiserror::Error;

/// Stable error taxonomy for the whole crate.
///
/// Once a decoder or encoder has been successfully initialized, only
/// `IoError` and `DeflatedSizeMismatch` can occur during the remainder of the
/// operation; every other variant is surfaced during construction/validation.
#[derive(Error, Debug)]
pub enum OmFilesError {
    #[error("invalid compression type")]
    InvalidCompressionType,

    #[error("invalid data type")]
    InvalidDataType,

    #[error("out of bound read: offset {offset}, count {count}, dimension {dimension}")]
    OutOfBoundRead {
        offset: u64,
        count: u64,
        dimension: u64,
    },

    #[error("not an OM file: trailer and legacy header both failed to validate")]
    NotAnOmFile,

    #[error("deflated size mismatch: entropy coder consumed {actual} bytes, LUT entry claimed {expected}")]
    DeflatedSizeMismatch { expected: u64, actual: u64 },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("dimension out of bounds: range {range:?}, allowed 0..{allowed}")]
    DimensionOutOfBounds { range: Range<u64>, allowed: u64 },

    #[error("chunk dimension {chunk} is larger than overall dimension {dimension}")]
    ChunkDimensionIsLargerThanDim { chunk: u64, dimension: u64 },

    #[error("dimension must be larger than 0")]
    DimensionMustBeLargerThanZero,

    #[error("mismatching cube dimension length: got {got}, expected {expected}")]
    MismatchingCubeDimensionLength { got: usize, expected: usize },

    #[error("variable has no such child: {0}")]
    NoSuchChild(String),

    #[error("variable is not an array")]
    NotAnArray,

    #[error("variable is not a scalar of the requested type")]
    NotAScalarOfType,

    #[error("string is too long to be stored as a name ({0} bytes, max 65535)")]
    NameTooLong(usize),
}

pub type Result<T> = std::result::Result<T, OmFilesError>;

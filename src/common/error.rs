//! Error types for IBLT operations

use std::fmt;

/// Errors that can occur while constructing, mutating, or decoding an [`Iblt`](crate::Iblt)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IbltError {
    /// Invalid parameter provided to the constructor
    InvalidParameter {
        /// Parameter name
        param: String,
        /// Invalid value provided
        value: String,
        /// Constraint that was violated
        constraint: String,
    },

    /// A key or value exceeded its configured fixed-length budget
    InputTooLong {
        /// Which field overflowed ("key" or "value")
        param: String,
        /// Actual length of the input
        len: usize,
        /// Configured maximum length
        max: usize,
    },

    /// A hash index or a hash-produced cell index fell outside its valid range
    BadHashIndex {
        /// The out-of-range index that was requested or produced
        index: usize,
        /// The exclusive upper bound it was expected to stay under
        k: usize,
    },

    /// Deserialized input did not start with the IBLT magic bytes
    BadMagic,

    /// The declared payload length in a serialized header disagreed with the
    /// actual number of bytes supplied
    BadLength {
        /// Length implied by the header
        expected: usize,
        /// Length of the buffer actually supplied
        actual: usize,
    },

    /// Byte-vector arithmetic was invoked on operands of unequal length
    ///
    /// This indicates a programmer error internal to the crate; it is never
    /// reachable through the public API on a correctly constructed table.
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Length actually seen
        actual: usize,
    },

    /// A serialized header could not be parsed into a valid table
    DeserializationError(String),
}

impl fmt::Display for IbltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IbltError::InvalidParameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "invalid parameter '{}': value '{}' {}",
                    param, value, constraint
                )
            }
            IbltError::InputTooLong { param, len, max } => write!(
                f,
                "{} of length {} exceeds configured maximum of {}",
                param, len, max
            ),
            IbltError::BadHashIndex { index, k } => {
                write!(f, "hash index {} out of range [0, {})", index, k)
            }
            IbltError::BadMagic => {
                write!(f, "serialized data does not start with the IBLT magic bytes")
            }
            IbltError::BadLength { expected, actual } => write!(
                f,
                "serialized payload length mismatch: header implies {} bytes, got {}",
                expected, actual
            ),
            IbltError::LengthMismatch { expected, actual } => write!(
                f,
                "byte-vector arithmetic length mismatch: expected {}, got {}",
                expected, actual
            ),
            IbltError::DeserializationError(msg) => write!(f, "deserialization error: {}", msg),
        }
    }
}

impl std::error::Error for IbltError {}

/// Result type alias for IBLT operations
pub type Result<T> = std::result::Result<T, IbltError>;

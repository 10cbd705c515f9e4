//! Validation utilities for IBLT construction and deserialization bounds checking

use crate::common::{IbltError, Result};

/// Maximum cell count (m) and hash function count (k) accepted by the constructor.
///
/// This bounds memory usage during construction and keeps the decoder's O(m^2)
/// peeling loop from becoming unreasonable by accident.
pub const MAX_CELL_COUNT: u32 = 1 << 24;

/// Maximum serialized payload size accepted by `deserialize` (256MB), to avoid
/// allocating an unreasonable amount of memory from an untrusted or corrupt header.
pub const MAX_BYTE_SIZE: usize = 256 * 1024 * 1024;

/// Validates the `m` (cell count) constructor parameter.
pub fn validate_cell_count(m: u32) -> Result<()> {
    if m == 0 {
        return Err(IbltError::InvalidParameter {
            param: "m".to_string(),
            value: m.to_string(),
            constraint: "must be >= 1".to_string(),
        });
    }
    if m > MAX_CELL_COUNT {
        return Err(IbltError::InvalidParameter {
            param: "m".to_string(),
            value: m.to_string(),
            constraint: format!("must not exceed {}", MAX_CELL_COUNT),
        });
    }
    Ok(())
}

/// Validates the `k` (hash function count) constructor parameter.
pub fn validate_hash_count(k: u32) -> Result<()> {
    if k == 0 {
        return Err(IbltError::InvalidParameter {
            param: "k".to_string(),
            value: k.to_string(),
            constraint: "must be >= 1".to_string(),
        });
    }
    Ok(())
}

/// Validates a fixed-length field size (`key_size`, `value_size`, or `hash_key_sum_size`).
pub fn validate_field_size(param: &str, size: u32) -> Result<()> {
    if size == 0 {
        return Err(IbltError::InvalidParameter {
            param: param.to_string(),
            value: size.to_string(),
            constraint: "must be >= 1".to_string(),
        });
    }
    Ok(())
}

/// Validates that a deserialized payload length doesn't exceed the safety limit.
pub fn validate_byte_size(size: usize) -> Result<()> {
    if size > MAX_BYTE_SIZE {
        return Err(IbltError::DeserializationError(format!(
            "serialized payload of {} bytes exceeds the maximum allowed size of {}",
            size, MAX_BYTE_SIZE
        )));
    }
    Ok(())
}

/// Validates that a buffer has at least `required` bytes available.
pub fn validate_min_size(actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(IbltError::DeserializationError(format!(
            "insufficient data: need at least {} bytes, got {}",
            required, actual
        )));
    }
    Ok(())
}

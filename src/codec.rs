//! Key/value codec: fixed-length encoding and lossy decoding
//!
//! `encode` zero-pads a byte string out to a fixed length. `decode` is its
//! approximate inverse, but strips *every* zero byte from the buffer rather than
//! only trailing padding, so a key or value containing an embedded zero byte does
//! not round-trip faithfully. This mirrors the reference implementation this crate
//! formalizes and is an intentional, documented limit rather than an oversight: the
//! wire format (see [`crate::serialize`]) is defined to be bit-exact with that
//! reference, so "fixing" the codec (e.g. by length-prefixing) would break
//! compatibility. Callers targeting arbitrary-byte payloads should avoid embedded
//! zero bytes, or treat that as an explicit, documented deviation of their own.

use crate::common::{IbltError, Result};

/// Encodes `x` into a zero-padded buffer of exactly `len` bytes.
///
/// # Errors
/// Returns [`IbltError::InputTooLong`] if `x.len() > len`.
pub fn encode(param: &str, x: &[u8], len: usize) -> Result<Vec<u8>> {
    if x.len() > len {
        return Err(IbltError::InputTooLong {
            param: param.to_string(),
            len: x.len(),
            max: len,
        });
    }
    let mut out = vec![0u8; len];
    out[..x.len()].copy_from_slice(x);
    Ok(out)
}

/// Strips every zero byte from `v`, preserving the relative order of the rest.
pub fn decode(v: &[u8]) -> Vec<u8> {
    v.iter().copied().filter(|&b| b != 0).collect()
}

/// Projects a fixed-size digest into a `len`-byte window: truncates leading
/// bytes if `x` is longer than `len`, zero-pads if shorter. Never fails.
///
/// This is distinct from [`encode`]. `encode` guards a caller-supplied key or
/// value against silently overflowing its configured fixed length (overflow
/// there is a usage error). A key fingerprint, by contrast, is always a fixed
/// 64-byte SHA-512 digest that gets deliberately narrowed down to
/// `hash_key_sum_size` bytes (10 by default) to save space; narrowing it is the
/// intended operation, not an error condition.
pub fn encode_truncating(x: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let copy_len = x.len().min(len);
    out[..copy_len].copy_from_slice(&x[..copy_len]);
    out
}

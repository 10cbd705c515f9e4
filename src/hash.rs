//! The default SHA-512-backed hash family
//!
//! Every other sketch in this crate reaches for a fast, non-cryptographic hash
//! (`xxhash`, `murmur3`) because collisions there only cost a little extra error.
//! An IBLT is different: the [`key_fingerprint`] is what the peeling decoder uses to
//! reject a false peel, so it needs to be collision-resistant, not just
//! well-distributed. `cell_hash` and `key_fingerprint` are both derived from the same
//! SHA-512 digest family so that a deserialized table (which always uses this default,
//! see [`crate::Iblt::deserialize`]) behaves identically across platforms.

use sha2::{Digest, Sha512};

use crate::common::{IbltError, Result};

/// Maps `key` to a cell index in `[0, m)` using the `i`-th hash function.
///
/// Computes `SHA-512(decimal(i) || key)`, takes the leading
/// `ceil(log2(m) / 4)` hex characters of that digest, parses them as a
/// big-endian hex integer, and reduces mod `m`.
///
/// # Errors
/// Returns [`IbltError::BadHashIndex`] if `i` is not in `[0, k)`.
pub fn cell_hash(i: usize, key: &[u8], k: usize, m: u32) -> Result<usize> {
    if i >= k {
        return Err(IbltError::BadHashIndex { index: i, k });
    }
    let mut hasher = Sha512::new();
    hasher.update(i.to_string().as_bytes());
    hasher.update(key);
    let digest = hasher.finalize();

    let hex_len = hex_length(m);
    let value = leading_hex_to_u64(&digest, hex_len);
    Ok((value % m as u64) as usize)
}

/// The full raw 64-byte SHA-512 digest of `key` (no index prefix).
pub fn key_fingerprint(key: &[u8]) -> [u8; 64] {
    let digest = Sha512::digest(key);
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

/// Builds the unique set of cell indices a key touches: the deduplicated set of
/// `cell_hash(i, key, k, m)` for `i` in `0..k`.
///
/// When two hash functions collide on the same index, the key simply touches
/// fewer than `k` cells; no rehashing is performed.
pub fn index_set(key: &[u8], k: usize, m: u32) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(k);
    for i in 0..k {
        let idx = cell_hash(i, key, k, m)?;
        if !indices.contains(&idx) {
            indices.push(idx);
        }
    }
    Ok(indices)
}

/// Number of leading hex characters of a SHA-512 digest needed to cover `[0, m)`:
/// `ceil(log2(m) / 4)`.
fn hex_length(m: u32) -> usize {
    if m <= 1 {
        return 0;
    }
    ((m as f64).log2() / 4.0).ceil() as usize
}

/// Parses the leading `hex_len` hex characters of `digest` as a big-endian integer.
fn leading_hex_to_u64(digest: &[u8], hex_len: usize) -> u64 {
    // Each byte contributes two hex characters; walk nibble by nibble so an odd
    // hex_len only consumes the high nibble of its final byte, matching how a
    // hex-string prefix would be parsed.
    let mut value: u64 = 0;
    for nibble_index in 0..hex_len {
        let byte = digest[nibble_index / 2];
        let nibble = if nibble_index % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        };
        value = (value << 4) | nibble as u64;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_hash_in_range() {
        for m in [1u32, 2, 3, 7, 30, 1000] {
            for i in 0..4 {
                let idx = cell_hash(i, b"somekey", 4, m).unwrap();
                assert!(idx < m as usize);
            }
        }
    }

    #[test]
    fn test_cell_hash_deterministic() {
        let a = cell_hash(0, b"key", 3, 100).unwrap();
        let b = cell_hash(0, b"key", 3, 100).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cell_hash_bad_index() {
        let err = cell_hash(3, b"key", 3, 100).unwrap_err();
        assert_eq!(err, IbltError::BadHashIndex { index: 3, k: 3 });
    }

    #[test]
    fn test_cell_hash_varies_with_index() {
        // Not a correctness requirement, but the whole point of k hash functions
        // is that they usually disagree.
        let a = cell_hash(0, b"key", 4, 1_000_000).unwrap();
        let b = cell_hash(1, b"key", 4, 1_000_000).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_fingerprint_length() {
        assert_eq!(key_fingerprint(b"abc").len(), 64);
    }

    #[test]
    fn test_key_fingerprint_deterministic() {
        assert_eq!(key_fingerprint(b"abc"), key_fingerprint(b"abc"));
        assert_ne!(key_fingerprint(b"abc"), key_fingerprint(b"abd"));
    }

    #[test]
    fn test_index_set_deduplicates() {
        // m=1 forces every hash function to collide on index 0.
        let indices = index_set(b"key", 4, 1).unwrap();
        assert_eq!(indices, vec![0]);
    }

    #[test]
    fn test_index_set_size_bound() {
        let indices = index_set(b"key", 4, 1000).unwrap();
        assert!(indices.len() <= 4);
        assert!(!indices.is_empty());
    }

    #[test]
    fn test_hex_length_matches_reference_formula() {
        assert_eq!(hex_length(1), 0);
        assert_eq!(hex_length(16), 1);
        assert_eq!(hex_length(30), 2);
        assert_eq!(hex_length(256), 2);
    }
}

//! An Invertible Bloom Lookup Table (IBLT): a peelable, serializable key/value
//! sketch for set reconciliation.
//!
//! An IBLT stores key/value pairs in a fixed-size array of cells. Unlike a plain
//! Bloom filter, its contents can be *listed back out* as long as the number of
//! entries stays below the table's capacity: [`Iblt::list_entries`] repeatedly
//! peels cells that carry exactly one surviving contribution until none are left.
//! Insertion and deletion are the same operation with an opposite sign, so two
//! tables can be diffed by subtracting one from the other cell-by-cell and
//! peeling the result to recover exactly the entries that differ.
//!
//! # Wire format
//!
//! [`Iblt::serialize`] produces:
//!
//! - 4-byte magic `b"IBLT"`
//! - header: six big-endian `u32` fields: `m`, `key_size`, `value_size`,
//!   `hash_key_sum_size`, `value_key_sum_size` (reserved, always 0), `k`
//! - `m` cells, each: big-endian `i32` count, then `key_sum`, `value_sum`,
//!   `hash_key_sum`, and a reserved `value_key_sum` field, at their configured
//!   widths
//!
//! # Examples
//! ```
//! use iblt::Iblt;
//!
//! let mut t = Iblt::new(30, 4, 16, 16).unwrap();
//! t.insert(b"alice", b"1").unwrap();
//! t.insert(b"bob", b"2").unwrap();
//!
//! let report = t.list_entries().unwrap();
//! assert_eq!(report.entries.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bytevec;
pub mod codec;
pub mod common;
pub mod hash;
mod iblt;

pub use common::{IbltError, Result};
pub use iblt::{DecodeReport, DecodeStatus, HashFn, Iblt, Lookup, DEFAULT_HASH_KEY_SUM_SIZE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_compiles() {
        let t = Iblt::new(10, 3, 8, 8).unwrap();
        assert!(t.is_empty());
    }
}

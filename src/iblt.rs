//! Invertible Bloom Lookup Table: insert, delete, point lookup, and peeling decode
//!
//! An [`Iblt`] stores `(key, value)` pairs across a fixed array of `m` cells. Each
//! key touches up to `k` cells, chosen by [`crate::hash::index_set`]. Every indexed
//! cell accumulates a signed count plus three running byte-vector sums
//! (key, value, and key-fingerprint). When the load factor is low enough, every
//! inserted pair, and every "deleted" pair that was never actually inserted, can
//! be recovered by repeatedly peeling cells that carry exactly one contribution.
//!
//! See the crate-level docs for the algorithm's background and the wire format.

use std::fmt;
use std::sync::Arc;

use crate::bytevec;
use crate::codec;
use crate::common::validation;
use crate::common::{IbltError, Result};
use crate::hash;

/// Default width, in bytes, of the per-cell key-fingerprint sum.
///
/// Ten bytes gives roughly 2^-80 odds of a false peel per cell; smaller values
/// trade that margin for a smaller wire size and must be chosen deliberately.
pub const DEFAULT_HASH_KEY_SUM_SIZE: u32 = 10;

const MAGIC: [u8; 4] = [0x49, 0x42, 0x4C, 0x54]; // ASCII "IBLT"
const HEADER_LEN: usize = 4 + 6 * 4;

/// A custom cell-hash function: given a hash index `i` in `[0, k)` and a key,
/// returns a cell index in `[0, m)`.
///
/// Supplied to [`Iblt::with_hash`] in place of the default SHA-512 family. It is
/// never persisted by [`Iblt::serialize`]: a deserialized table always uses the
/// default hash family. A returned index outside `[0, m)` is rejected with
/// [`IbltError::BadHashIndex`] rather than used to index a cell.
pub type HashFn = Arc<dyn Fn(usize, &[u8]) -> Result<usize> + Send + Sync>;

/// One slot in the table.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Cell {
    count: i32,
    key_sum: Vec<u8>,
    value_sum: Vec<u8>,
    hash_key_sum: Vec<u8>,
}

impl Cell {
    fn new(key_size: usize, value_size: usize, hash_key_sum_size: usize) -> Self {
        Cell {
            count: 0,
            key_sum: vec![0u8; key_size],
            value_sum: vec![0u8; value_size],
            hash_key_sum: vec![0u8; hash_key_sum_size],
        }
    }

    fn has_no_evidence(&self) -> bool {
        self.count == 0 && bytevec::is_zero(&self.key_sum) && bytevec::is_zero(&self.hash_key_sum)
    }
}

/// The outcome of [`Iblt::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key is definitively absent from the table.
    NoMatch,
    /// The key was found with an inserted value.
    Match(Vec<u8>),
    /// The key was deleted without ever having been inserted.
    DeletedMatch(Vec<u8>),
    /// No cell gave a definitive verdict; the key may or may not be present.
    Inconclusive,
}

/// Terminal status of [`Iblt::list_entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Every cell was drained to zero; `entries` and `deleted_entries` are exhaustive.
    Complete,
    /// Peeling stalled with non-empty cells remaining; the returned lists are a
    /// partial, but confirmed, subset of the true contents.
    Incomplete,
}

/// The result of peeling a table via [`Iblt::list_entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    /// Whether every cell was fully peeled.
    pub status: DecodeStatus,
    /// `(key, value)` pairs recovered from positive-pure cells.
    pub entries: Vec<(Vec<u8>, Vec<u8>)>,
    /// `(key, value)` pairs recovered from negative-pure cells: deletions that
    /// were never matched by a prior insertion.
    pub deleted_entries: Vec<(Vec<u8>, Vec<u8>)>,
}

/// An Invertible Bloom Lookup Table.
///
/// # Examples
/// ```
/// use iblt::Iblt;
///
/// let mut t = Iblt::new(30, 4, 10, 10).unwrap();
/// t.insert(b"testkey", b"testvalue").unwrap();
/// t.delete(b"testkey", b"testvalue").unwrap();
/// assert!(t.is_empty());
/// ```
#[derive(Clone)]
pub struct Iblt {
    m: u32,
    k: u32,
    key_size: u32,
    value_size: u32,
    hash_key_sum_size: u32,
    cells: Vec<Cell>,
    hash_fn: Option<HashFn>,
}

impl fmt::Debug for Iblt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iblt")
            .field("m", &self.m)
            .field("k", &self.k)
            .field("key_size", &self.key_size)
            .field("value_size", &self.value_size)
            .field("hash_key_sum_size", &self.hash_key_sum_size)
            .field("custom_hash", &self.hash_fn.is_some())
            .finish()
    }
}

impl PartialEq for Iblt {
    /// Two tables are equal iff their parameters and cell contents match exactly.
    /// A custom hash function, if any, is not part of the comparison.
    fn eq(&self, other: &Self) -> bool {
        self.m == other.m
            && self.k == other.k
            && self.key_size == other.key_size
            && self.value_size == other.value_size
            && self.hash_key_sum_size == other.hash_key_sum_size
            && self.cells == other.cells
    }
}

impl Eq for Iblt {}

impl Iblt {
    /// Creates a new table with the default `hash_key_sum_size` (10 bytes).
    ///
    /// # Errors
    /// Returns [`IbltError::InvalidParameter`] if `m`, `k`, `key_size`, or
    /// `value_size` is zero.
    pub fn new(m: u32, k: u32, key_size: u32, value_size: u32) -> Result<Self> {
        Self::with_params(m, k, key_size, value_size, DEFAULT_HASH_KEY_SUM_SIZE)
    }

    /// Creates a new table with an explicit `hash_key_sum_size`.
    ///
    /// # Errors
    /// Returns [`IbltError::InvalidParameter`] if any parameter is zero, or if `m`
    /// exceeds [`validation::MAX_CELL_COUNT`].
    pub fn with_params(
        m: u32,
        k: u32,
        key_size: u32,
        value_size: u32,
        hash_key_sum_size: u32,
    ) -> Result<Self> {
        validation::validate_cell_count(m)?;
        validation::validate_hash_count(k)?;
        validation::validate_field_size("key_size", key_size)?;
        validation::validate_field_size("value_size", value_size)?;
        validation::validate_field_size("hash_key_sum_size", hash_key_sum_size)?;

        let cells = (0..m)
            .map(|_| Cell::new(key_size as usize, value_size as usize, hash_key_sum_size as usize))
            .collect();

        Ok(Iblt {
            m,
            k,
            key_size,
            value_size,
            hash_key_sum_size,
            cells,
            hash_fn: None,
        })
    }

    /// Creates a new table that consults `hash_fn` instead of the default SHA-512
    /// family for `cell_hash`. The custom hash is never persisted by [`Iblt::serialize`].
    pub fn with_hash(
        m: u32,
        k: u32,
        key_size: u32,
        value_size: u32,
        hash_key_sum_size: u32,
        hash_fn: HashFn,
    ) -> Result<Self> {
        let mut table = Self::with_params(m, k, key_size, value_size, hash_key_sum_size)?;
        table.hash_fn = Some(hash_fn);
        Ok(table)
    }

    /// Number of cells in the table.
    pub fn cell_count(&self) -> u32 {
        self.m
    }

    /// Number of hash functions.
    pub fn hash_count(&self) -> u32 {
        self.k
    }

    /// Configured maximum key length.
    pub fn key_size(&self) -> u32 {
        self.key_size
    }

    /// Configured maximum value length.
    pub fn value_size(&self) -> u32 {
        self.value_size
    }

    /// Configured width of the per-cell key-fingerprint sum.
    pub fn hash_key_sum_size(&self) -> u32 {
        self.hash_key_sum_size
    }

    fn index_set(&self, key: &[u8]) -> Result<Vec<usize>> {
        match &self.hash_fn {
            Some(f) => {
                let mut indices = Vec::with_capacity(self.k as usize);
                for i in 0..self.k as usize {
                    let idx = f(i, key)?;
                    // A misbehaving custom hash is the caller's bug, not ours; reject it
                    // here rather than panicking on the cell index below.
                    if idx >= self.m as usize {
                        return Err(IbltError::BadHashIndex {
                            index: idx,
                            k: self.m as usize,
                        });
                    }
                    if !indices.contains(&idx) {
                        indices.push(idx);
                    }
                }
                Ok(indices)
            }
            None => hash::index_set(key, self.k as usize, self.m),
        }
    }

    fn fingerprint_sum(&self, key: &[u8]) -> Vec<u8> {
        let fingerprint = hash::key_fingerprint(key);
        codec::encode_truncating(&fingerprint, self.hash_key_sum_size as usize)
    }

    /// Inserts a `(key, value)` pair, incrementing every cell the key hashes to.
    ///
    /// # Errors
    /// Returns [`IbltError::InputTooLong`] if `key` or `value` exceeds its
    /// configured fixed length. On error, no cell is mutated.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.apply(key, value, 1)
    }

    /// Deletes a `(key, value)` pair, decrementing every cell the key hashes to.
    ///
    /// Deleting a pair that was never inserted is allowed; it leaves the touched
    /// cells in a "negative" state that [`Iblt::list_entries`] reports as a
    /// [`DecodeReport::deleted_entries`] entry.
    ///
    /// # Errors
    /// Returns [`IbltError::InputTooLong`] if `key` or `value` exceeds its
    /// configured fixed length. On error, no cell is mutated.
    pub fn delete(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.apply(key, value, -1)
    }

    fn apply(&mut self, key: &[u8], value: &[u8], sign: i32) -> Result<()> {
        let key_enc = codec::encode("key", key, self.key_size as usize)?;
        let value_enc = codec::encode("value", value, self.value_size as usize)?;
        let fp_enc = self.fingerprint_sum(key);
        let indices = self.index_set(key)?;

        for idx in indices {
            let cell = &mut self.cells[idx];
            cell.count += sign;
            if sign > 0 {
                cell.key_sum = bytevec::sum(&cell.key_sum, &key_enc)?;
                cell.value_sum = bytevec::sum(&cell.value_sum, &value_enc)?;
                cell.hash_key_sum = bytevec::sum(&cell.hash_key_sum, &fp_enc)?;
            } else {
                cell.key_sum = bytevec::diff(&cell.key_sum, &key_enc)?;
                cell.value_sum = bytevec::diff(&cell.value_sum, &value_enc)?;
                cell.hash_key_sum = bytevec::diff(&cell.hash_key_sum, &fp_enc)?;
            }
        }
        Ok(())
    }

    /// Looks up `key`, returning one of four classifications (see [`Lookup`]).
    ///
    /// # Errors
    /// Returns [`IbltError::InputTooLong`] if `key` exceeds `key_size`.
    pub fn get(&self, key: &[u8]) -> Result<Lookup> {
        let key_enc = codec::encode("key", key, self.key_size as usize)?;
        let fp_enc = self.fingerprint_sum(key);
        let neg_key_enc = bytevec::negate(&key_enc);
        let neg_fp_enc = bytevec::negate(&fp_enc);

        for idx in self.index_set(key)? {
            let cell = &self.cells[idx];
            if cell.has_no_evidence() {
                return Ok(Lookup::NoMatch);
            } else if cell.count == 1 && cell.key_sum == key_enc && cell.hash_key_sum == fp_enc {
                return Ok(Lookup::Match(codec::decode(&cell.value_sum)));
            } else if cell.count == -1
                && cell.key_sum == neg_key_enc
                && cell.hash_key_sum == neg_fp_enc
            {
                return Ok(Lookup::DeletedMatch(codec::decode(&bytevec::negate(
                    &cell.value_sum,
                ))));
            }
        }
        Ok(Lookup::Inconclusive)
    }

    /// Returns true iff every cell's count is zero.
    ///
    /// This does not inspect the byte-vector sums: a table produced by equal
    /// numbers of inserts and deletes of the same pairs satisfies this.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| cell.count == 0)
    }

    /// Peels the table to recover its contents.
    ///
    /// Operates on an internal deep copy; `self` is never mutated. Repeatedly finds
    /// a "pure" cell (count = ±1 whose fingerprint checks out), records the implied
    /// entry, and reverses its contribution, until a full scan finds nothing left to
    /// peel.
    ///
    /// # Errors
    /// Returns an error only if a recovered key or value (themselves bounded by
    /// `key_size`/`value_size`) somehow fails re-encoding; this should not happen
    /// on a table produced solely through [`Iblt::insert`]/[`Iblt::delete`].
    pub fn list_entries(&self) -> Result<DecodeReport> {
        let mut working = self.clone();
        let mut entries = Vec::new();
        let mut deleted_entries = Vec::new();

        loop {
            let mut peeled = false;
            for idx in 0..working.cells.len() {
                let cell = working.cells[idx].clone();

                if cell.count == 1 {
                    let key = codec::decode(&cell.key_sum);
                    if cell.hash_key_sum == working.fingerprint_sum(&key) {
                        let value = codec::decode(&cell.value_sum);
                        working.delete(&key, &value)?;
                        entries.push((key, value));
                        peeled = true;
                        break;
                    }
                } else if cell.count == -1 {
                    let neg_key_sum = bytevec::negate(&cell.key_sum);
                    let key = codec::decode(&neg_key_sum);
                    let neg_hash_key_sum = bytevec::negate(&cell.hash_key_sum);
                    if neg_hash_key_sum == working.fingerprint_sum(&key) {
                        let value = codec::decode(&bytevec::negate(&cell.value_sum));
                        working.insert(&key, &value)?;
                        deleted_entries.push((key, value));
                        peeled = true;
                        break;
                    }
                }
            }
            if !peeled {
                break;
            }
        }

        let status = if working.is_empty() {
            DecodeStatus::Complete
        } else {
            DecodeStatus::Incomplete
        };

        Ok(DecodeReport {
            status,
            entries,
            deleted_entries,
        })
    }

    /// Serializes the table to the bit-exact wire format described in the crate docs.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            HEADER_LEN
                + self.m as usize
                    * (4 + self.key_size as usize
                        + self.value_size as usize
                        + self.hash_key_sum_size as usize),
        );

        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.m.to_be_bytes());
        out.extend_from_slice(&self.key_size.to_be_bytes());
        out.extend_from_slice(&self.value_size.to_be_bytes());
        out.extend_from_slice(&self.hash_key_sum_size.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes()); // value_key_sum_size, reserved
        out.extend_from_slice(&self.k.to_be_bytes());

        for cell in &self.cells {
            out.extend_from_slice(&cell.count.to_be_bytes());
            out.extend_from_slice(&cell.key_sum);
            out.extend_from_slice(&cell.value_sum);
            out.extend_from_slice(&cell.hash_key_sum);
        }

        out
    }

    /// Deserializes a table previously produced by [`Iblt::serialize`].
    ///
    /// The resulting table always uses the default hash family, regardless of
    /// whether the original was constructed with [`Iblt::with_hash`].
    ///
    /// # Errors
    /// Returns [`IbltError::BadMagic`] if the leading 4 bytes are not the IBLT
    /// magic, or [`IbltError::BadLength`] if the header's declared size disagrees
    /// with `data.len()`.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        validation::validate_min_size(data.len(), HEADER_LEN)?;
        if data[0..4] != MAGIC {
            return Err(IbltError::BadMagic);
        }

        let m = u32::from_be_bytes(data[4..8].try_into().unwrap());
        let key_size = u32::from_be_bytes(data[8..12].try_into().unwrap());
        let value_size = u32::from_be_bytes(data[12..16].try_into().unwrap());
        let hash_key_sum_size = u32::from_be_bytes(data[16..20].try_into().unwrap());
        let value_key_sum_size = u32::from_be_bytes(data[20..24].try_into().unwrap());
        let k = u32::from_be_bytes(data[24..28].try_into().unwrap());

        let cell_size = (4u64)
            .checked_add(key_size as u64)
            .and_then(|v| v.checked_add(value_size as u64))
            .and_then(|v| v.checked_add(hash_key_sum_size as u64))
            .and_then(|v| v.checked_add(value_key_sum_size as u64))
            .ok_or_else(|| IbltError::DeserializationError("header field sizes overflow".to_string()))?;
        let payload_len = cell_size
            .checked_mul(m as u64)
            .ok_or_else(|| IbltError::DeserializationError("payload size overflows".to_string()))?;
        let expected_total = (HEADER_LEN as u64)
            .checked_add(payload_len)
            .ok_or_else(|| IbltError::DeserializationError("payload size overflows".to_string()))?;

        validation::validate_byte_size(expected_total as usize)?;
        if data.len() as u64 != expected_total {
            return Err(IbltError::BadLength {
                expected: expected_total as usize,
                actual: data.len(),
            });
        }

        let mut table = Iblt::with_params(m, k, key_size, value_size, hash_key_sum_size)?;

        let mut offset = HEADER_LEN;
        for cell in table.cells.iter_mut() {
            cell.count = i32::from_be_bytes(data[offset..offset + 4].try_into().unwrap());
            offset += 4;

            cell.key_sum = data[offset..offset + key_size as usize].to_vec();
            offset += key_size as usize;

            cell.value_sum = data[offset..offset + value_size as usize].to_vec();
            offset += value_size as usize;

            cell.hash_key_sum = data[offset..offset + hash_key_sum_size as usize].to_vec();
            offset += hash_key_sum_size as usize;

            offset += value_key_sum_size as usize; // reserved field, discarded
        }

        Ok(table)
    }
}

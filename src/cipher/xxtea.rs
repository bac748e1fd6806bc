//! XXTEA ("Corrected Block TEA") block transform.
//!
//! Operates in place on a slice of 32-bit words using a 128-bit key.
//! Unlike fixed-size block ciphers, the block is the whole slice: any
//! length of two words or more is a valid block.
//!
//! # Example
//!
//! ```
//! use cutter_link::cipher::{transform, CipherKey, TransformStatus};
//!
//! let key = CipherKey::new([1, 2, 3, 4]);
//! let mut words = [10u32, 20, 30];
//!
//! assert_eq!(transform(&mut words, 3, &key), TransformStatus::Encoded);
//! assert_ne!(words, [10, 20, 30]);
//!
//! assert_eq!(transform(&mut words, -3, &key), TransformStatus::Decoded);
//! assert_eq!(words, [10, 20, 30]);
//! ```

use super::BlockCipher;
use crate::error::{PlotterError, Result};

/// Key schedule constant (golden ratio).
pub const DELTA: u32 = 0x9e37_79b9;

/// Key size in bytes.
pub const KEY_BYTES: usize = 16;

/// Smallest byte buffer the block wrappers accept (two words).
pub const MIN_BLOCK_BYTES: usize = 8;

/// A 128-bit cipher key held as four 32-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherKey([u32; 4]);

impl CipherKey {
    /// Create a key from its four words.
    pub const fn new(words: [u32; 4]) -> Self {
        Self(words)
    }

    /// Create a key from 16 bytes, read as four little-endian words.
    ///
    /// # Errors
    ///
    /// Returns [`PlotterError::InvalidKeyLength`] for any other length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_BYTES {
            return Err(PlotterError::InvalidKeyLength(bytes.len()));
        }
        let mut words = [0u32; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(Self(words))
    }

    /// The key words.
    #[inline]
    pub fn words(&self) -> &[u32; 4] {
        &self.0
    }

    #[inline]
    fn word(&self, p: usize, e: u32) -> u32 {
        self.0[(p & 3) ^ e as usize]
    }
}

/// Outcome of a raw [`transform`] call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStatus {
    /// Words were encoded.
    Encoded,
    /// Words were decoded.
    Decoded,
    /// `|n| <= 1`: nothing was done.
    Degenerate,
}

impl TransformStatus {
    /// True unless the call was degenerate.
    #[inline]
    pub fn is_performed(self) -> bool {
        self != TransformStatus::Degenerate
    }
}

/// Per-round mixing function.
#[inline]
pub fn mx(y: u32, z: u32, sum: u32, e: u32, p: usize, key: &CipherKey) -> u32 {
    let a = ((z >> 5) ^ (y << 2)).wrapping_add((y >> 3) ^ (z << 4));
    let b = (sum ^ y).wrapping_add(key.word(p, e) ^ z);
    a ^ b
}

#[inline]
fn rounds(n: usize) -> u32 {
    6 + 52 / n as u32
}

/// Encode (`n > 1`) or decode (`n < -1`) the first `|n|` words of `v`.
///
/// For `n` in `-1..=1` the slice is left untouched and
/// [`TransformStatus::Degenerate`] is returned.
///
/// # Panics
///
/// Panics if `|n|` exceeds `v.len()`.
pub fn transform(v: &mut [u32], n: isize, key: &CipherKey) -> TransformStatus {
    let len = n.unsigned_abs();
    assert!(
        len <= v.len(),
        "transform length {} exceeds vector of {} words",
        len,
        v.len()
    );

    if n > 1 {
        encode(&mut v[..len], key);
        TransformStatus::Encoded
    } else if n < -1 {
        decode(&mut v[..len], key);
        TransformStatus::Decoded
    } else {
        TransformStatus::Degenerate
    }
}

fn encode(v: &mut [u32], key: &CipherKey) {
    let n = v.len();
    let mut sum: u32 = 0;
    let mut z = v[n - 1];
    let mut y;

    for _ in 0..rounds(n) {
        sum = sum.wrapping_add(DELTA);
        let e = (sum >> 2) & 3;
        for p in 0..n - 1 {
            y = v[p + 1];
            v[p] = v[p].wrapping_add(mx(y, z, sum, e, p, key));
            z = v[p];
        }
        y = v[0];
        v[n - 1] = v[n - 1].wrapping_add(mx(y, z, sum, e, n - 1, key));
        z = v[n - 1];
    }
}

fn decode(v: &mut [u32], key: &CipherKey) {
    let n = v.len();
    let mut sum = rounds(n).wrapping_mul(DELTA);
    let mut y = v[0];
    let mut z;

    while sum != 0 {
        let e = (sum >> 2) & 3;
        for p in (1..n).rev() {
            z = v[p - 1];
            v[p] = v[p].wrapping_sub(mx(y, z, sum, e, p, key));
            y = v[p];
        }
        z = v[n - 1];
        v[0] = v[0].wrapping_sub(mx(y, z, sum, e, 0, key));
        y = v[0];
        sum = sum.wrapping_sub(DELTA);
    }
}

/// Byte-oriented XXTEA cipher bound to one key.
///
/// Buffers are read as little-endian words, so the length must be a
/// multiple of 4 and at least 8 bytes.
#[derive(Debug, Clone)]
pub struct Xxtea {
    key: CipherKey,
}

impl Xxtea {
    /// Create a cipher for the given key.
    pub fn new(key: CipherKey) -> Self {
        Self { key }
    }

    /// Create a cipher from a 16-byte key.
    pub fn from_key_bytes(key: &[u8]) -> Result<Self> {
        Ok(Self::new(CipherKey::from_bytes(key)?))
    }

    /// The key in use.
    pub fn key(&self) -> &CipherKey {
        &self.key
    }

    /// Encode a word slice in place.
    pub fn encrypt_words(&self, words: &mut [u32]) -> TransformStatus {
        transform(words, words.len() as isize, &self.key)
    }

    /// Decode a word slice in place.
    pub fn decrypt_words(&self, words: &mut [u32]) -> TransformStatus {
        transform(words, -(words.len() as isize), &self.key)
    }

    fn process(&self, data: &[u8], encrypt: bool) -> Result<Vec<u8>> {
        if data.len() % 4 != 0 || data.len() < MIN_BLOCK_BYTES {
            return Err(PlotterError::InvalidPayloadLength(data.len()));
        }

        let mut words = words_from_le_bytes(data);
        let status = if encrypt {
            self.encrypt_words(&mut words)
        } else {
            self.decrypt_words(&mut words)
        };
        debug_assert!(status.is_performed());

        Ok(words_to_le_bytes(&words))
    }
}

impl BlockCipher for Xxtea {
    fn encrypt_block(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.process(data, true)
    }

    fn decrypt_block(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.process(data, false)
    }

    fn block_size(&self) -> usize {
        MIN_BLOCK_BYTES
    }

    fn key_length(&self) -> usize {
        KEY_BYTES
    }
}

/// Read a byte buffer as little-endian words. Trailing bytes are ignored.
pub(crate) fn words_from_le_bytes(data: &[u8]) -> Vec<u32> {
    data.chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Serialize words as little-endian bytes.
pub(crate) fn words_to_le_bytes(words: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 4);
    for word in words {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out
}

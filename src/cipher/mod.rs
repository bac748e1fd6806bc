//! Cipher module - XXTEA block transform and counter-mode stream.
//!
//! - [`transform`] - raw in-place word transform, the primitive everything else uses
//! - [`Xxtea`] - byte-oriented block cipher bound to one key
//! - [`CounterCipher`] - keystream generator for arbitrary-length buffers
//! - [`keys`] - the fixed keys the plotter firmware expects

mod ctr;
pub mod keys;
mod xxtea;

pub use ctr::{CounterCipher, KEYSTREAM_BLOCK};
pub use xxtea::{mx, transform, CipherKey, TransformStatus, Xxtea, DELTA, KEY_BYTES, MIN_BLOCK_BYTES};

pub(crate) use xxtea::{words_from_le_bytes, words_to_le_bytes};

use crate::error::Result;

/// Common interface for byte-oriented block ciphers.
///
/// Lets callers swap ciphers without depending on a concrete type.
pub trait BlockCipher {
    /// Encrypt a buffer and return the ciphertext.
    fn encrypt_block(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt a buffer produced by [`encrypt_block`](Self::encrypt_block).
    fn decrypt_block(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Natural block size in bytes.
    fn block_size(&self) -> usize;

    /// Key length in bytes.
    fn key_length(&self) -> usize;

    /// Key length in bits.
    fn key_bits(&self) -> usize {
        self.key_length() * 8
    }
}

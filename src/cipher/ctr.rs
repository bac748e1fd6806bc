//! Counter (CTR) mode on top of XXTEA.
//!
//! A 64-bit counter, held as `(high, low)` words, is encrypted one 8-byte
//! block at a time to produce keystream bytes. Data is XORed with the
//! keystream, so encryption and decryption are the same operation.
//!
//! Successive calls continue the keystream. Both ends must start from the
//! same IV and process the same byte count to stay in step.
//!
//! # Example
//!
//! ```
//! use cutter_link::cipher::{CipherKey, CounterCipher, Xxtea};
//!
//! let cipher = Xxtea::new(CipherKey::new([1, 2, 3, 4]));
//! let mut stream = CounterCipher::new(cipher);
//!
//! let sealed = stream.encrypt(b"hello plotter");
//!
//! stream.init_counter(0);
//! assert_eq!(stream.decrypt(&sealed), b"hello plotter");
//! ```

use super::{transform, Xxtea};

/// Keystream bytes produced per counter value.
pub const KEYSTREAM_BLOCK: usize = 8;

/// XXTEA keystream generator.
#[derive(Debug, Clone)]
pub struct CounterCipher {
    cipher: Xxtea,
    high: u32,
    low: u32,
    keystream: [u8; KEYSTREAM_BLOCK],
    cursor: usize,
}

impl CounterCipher {
    /// Create a stream with IV 0.
    pub fn new(cipher: Xxtea) -> Self {
        Self::with_iv(cipher, 0)
    }

    /// Create a stream with the given IV.
    pub fn with_iv(cipher: Xxtea, iv: u32) -> Self {
        let mut stream = Self {
            cipher,
            high: 0,
            low: 0,
            keystream: [0; KEYSTREAM_BLOCK],
            cursor: 0,
        };
        stream.init_counter(iv);
        stream
    }

    /// Reset the counter to `(0, iv)` and load the first keystream block.
    pub fn init_counter(&mut self, iv: u32) {
        self.high = 0;
        self.low = iv;
        self.regenerate_buffer();
    }

    /// Encrypt the current counter into the keystream buffer, then advance it.
    fn regenerate_buffer(&mut self) {
        let mut block = [self.high, self.low];
        let _ = transform(&mut block, 2, self.cipher.key());
        self.keystream[..4].copy_from_slice(&block[0].to_le_bytes());
        self.keystream[4..].copy_from_slice(&block[1].to_le_bytes());

        let (low, wrapped) = self.low.overflowing_add(1);
        self.low = low;
        if wrapped {
            self.high = self.high.wrapping_add(1);
        }
        self.cursor = 0;
    }

    /// Next keystream byte.
    #[inline]
    pub fn next_keystream_byte(&mut self) -> u8 {
        let b = self.keystream[self.cursor];
        self.cursor += 1;
        if self.cursor >= KEYSTREAM_BLOCK {
            self.regenerate_buffer();
        }
        b
    }

    /// XOR `buf` with the keystream in place.
    pub fn apply_keystream(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b ^= self.next_keystream_byte();
        }
    }

    /// XOR `data` with the keystream and return the result.
    pub fn xor_stream(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.apply_keystream(&mut out);
        out
    }

    /// Encrypt the next part of the stream.
    #[inline]
    pub fn encrypt(&mut self, data: &[u8]) -> Vec<u8> {
        self.xor_stream(data)
    }

    /// Decrypt the next part of the stream.
    #[inline]
    pub fn decrypt(&mut self, data: &[u8]) -> Vec<u8> {
        self.xor_stream(data)
    }

    /// Counter value that will seed the next keystream block, as `(high, low)`.
    pub fn counter(&self) -> (u32, u32) {
        (self.high, self.low)
    }

    /// Position inside the current keystream block.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

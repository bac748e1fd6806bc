//! Plotter command frames.
//!
//! Every command is a short frame:
//! ```text
//! ┌────────┬────────┬──────────────────────┐
//! │ Length │ Opcode │ Payload              │
//! │ 1 byte │ 1 byte │ length - 1 bytes     │
//! └────────┴────────┴──────────────────────┘
//! ```
//!
//! The length byte counts the opcode plus payload. Status and start/stop
//! commands carry three zero bytes. Pen moves carry a 3-word vector
//! `[MOVE_MARKER, x, y]` encrypted with the pen's key and serialized as
//! little-endian words.
//!
//! # Example
//!
//! ```
//! use cutter_link::protocol::{Command, Pen, opcode};
//!
//! let frame = Command::MovePen { pen: Pen::Up, x: 100, y: 200 }.encode();
//! assert_eq!(frame.len(), 14);
//! assert_eq!(frame.length_byte(), 13);
//! assert_eq!(frame.opcode(), opcode::MOVE_PEN);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::cipher::{keys, transform, words_from_le_bytes, words_to_le_bytes, CipherKey};
use crate::error::{PlotterError, Result};

/// Opcode constants.
pub mod opcode {
    /// Ask whether a cutting mat is loaded.
    pub const QUERY_MAT: u8 = 0x14;
    /// Begin a cut job.
    pub const START: u8 = 0x21;
    /// End a cut job.
    pub const STOP: u8 = 0x22;
    /// Move the head; the pen is selected by the payload key.
    pub const MOVE_PEN: u8 = 0x40;
}

/// Length byte of the status and start/stop frames.
pub const SHORT_FRAME_LENGTH: u8 = 4;

/// Length byte of the pen-move frame.
pub const MOVE_FRAME_LENGTH: u8 = 13;

/// Marker word placed before the coordinates in a move payload.
pub const MOVE_MARKER: u32 = 12345;

/// Reply size for the status query and pen moves.
pub const STANDARD_REPLY_LEN: usize = 5;

/// Frame header size (length + opcode).
pub const FRAME_HEADER_SIZE: usize = 2;

/// Pen position during a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pen {
    /// Travel without cutting.
    Up,
    /// Cut while moving.
    Down,
}

impl Pen {
    /// Key that seals this pen's move payload.
    pub fn key(self) -> &'static CipherKey {
        match self {
            Pen::Up => &keys::PEN_UP_KEY,
            Pen::Down => &keys::PEN_DOWN_KEY,
        }
    }
}

/// A plotter command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Query whether a mat is loaded.
    QueryMat,
    /// Start cutting.
    Start,
    /// Stop cutting.
    Stop,
    /// Move to `(x, y)` with the pen raised or lowered.
    MovePen { pen: Pen, x: u32, y: u32 },
}

impl Command {
    /// Opcode byte.
    pub fn opcode(&self) -> u8 {
        match self {
            Command::QueryMat => opcode::QUERY_MAT,
            Command::Start => opcode::START,
            Command::Stop => opcode::STOP,
            Command::MovePen { .. } => opcode::MOVE_PEN,
        }
    }

    /// Number of reply bytes the device sends, if any is awaited.
    pub fn expected_reply_len(&self) -> Option<usize> {
        match self {
            Command::QueryMat | Command::MovePen { .. } => Some(STANDARD_REPLY_LEN),
            Command::Start | Command::Stop => None,
        }
    }

    /// Build the wire frame.
    pub fn encode(&self) -> CommandFrame {
        match *self {
            Command::QueryMat | Command::Start | Command::Stop => {
                let mut buf = BytesMut::with_capacity(SHORT_FRAME_LENGTH as usize + 1);
                buf.put_u8(SHORT_FRAME_LENGTH);
                buf.put_u8(self.opcode());
                buf.put_bytes(0, 3);
                CommandFrame::from_bytes_unchecked(buf.freeze())
            }
            Command::MovePen { pen, x, y } => {
                let mut buf = BytesMut::with_capacity(MOVE_FRAME_LENGTH as usize + 1);
                buf.put_u8(MOVE_FRAME_LENGTH);
                buf.put_u8(opcode::MOVE_PEN);
                buf.put_slice(&encrypt_move(pen.key(), x, y));
                CommandFrame::from_bytes_unchecked(buf.freeze())
            }
        }
    }
}

/// Encrypt `[MOVE_MARKER, x, y]` with `key` and serialize it.
pub fn encrypt_move(key: &CipherKey, x: u32, y: u32) -> [u8; 12] {
    let mut v = [MOVE_MARKER, x, y];
    let _ = transform(&mut v, 3, key);

    let mut out = [0u8; 12];
    out.copy_from_slice(&words_to_le_bytes(&v));
    out
}

/// Decrypt a 12-byte move payload with `key`.
///
/// Returns the three plaintext words; the caller decides whether the marker
/// matches.
pub fn decrypt_move(key: &CipherKey, payload: &[u8]) -> Result<[u32; 3]> {
    if payload.len() != 12 {
        return Err(PlotterError::Protocol(format!(
            "Move payload must be 12 bytes, got {}",
            payload.len()
        )));
    }
    let words = words_from_le_bytes(payload);
    let mut v = [words[0], words[1], words[2]];
    let _ = transform(&mut v, -3, key);
    Ok(v)
}

/// An encoded command frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: Bytes,
}

impl CommandFrame {
    /// Wrap raw bytes after checking the length byte matches the buffer.
    pub fn from_bytes(bytes: Bytes) -> Result<Self> {
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(PlotterError::Protocol(format!(
                "Frame too short: {} bytes",
                bytes.len()
            )));
        }
        if bytes[0] as usize + 1 != bytes.len() {
            return Err(PlotterError::Protocol(format!(
                "Length byte {} does not match frame of {} bytes",
                bytes[0],
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    fn from_bytes_unchecked(bytes: Bytes) -> Self {
        debug_assert_eq!(bytes[0] as usize + 1, bytes.len());
        Self { bytes }
    }

    /// Length byte (opcode + payload size).
    #[inline]
    pub fn length_byte(&self) -> u8 {
        self.bytes[0]
    }

    /// Opcode byte.
    #[inline]
    pub fn opcode(&self) -> u8 {
        self.bytes[1]
    }

    /// Bytes after the opcode.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.bytes[FRAME_HEADER_SIZE..]
    }

    /// Whole frame.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap clone of the frame bytes.
    #[inline]
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Total frame size.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the frame back into a [`Command`].
    ///
    /// Move frames share one opcode, so the pen is recovered by trying each
    /// pen key and keeping the one whose plaintext starts with
    /// [`MOVE_MARKER`].
    pub fn parse(&self) -> Result<Command> {
        let short = |cmd: Command| -> Result<Command> {
            if self.length_byte() != SHORT_FRAME_LENGTH {
                return Err(PlotterError::Protocol(format!(
                    "Opcode {:#04x} expects length {}, got {}",
                    self.opcode(),
                    SHORT_FRAME_LENGTH,
                    self.length_byte()
                )));
            }
            Ok(cmd)
        };

        match self.opcode() {
            opcode::QUERY_MAT => short(Command::QueryMat),
            opcode::START => short(Command::Start),
            opcode::STOP => short(Command::Stop),
            opcode::MOVE_PEN => {
                if self.length_byte() != MOVE_FRAME_LENGTH {
                    return Err(PlotterError::Protocol(format!(
                        "Move frame expects length {}, got {}",
                        MOVE_FRAME_LENGTH,
                        self.length_byte()
                    )));
                }
                for pen in [Pen::Up, Pen::Down] {
                    let [marker, x, y] = decrypt_move(pen.key(), self.payload())?;
                    if marker == MOVE_MARKER {
                        return Ok(Command::MovePen { pen, x, y });
                    }
                }
                Err(PlotterError::Protocol(
                    "Move payload does not decrypt under any pen key".to_string(),
                ))
            }
            other => Err(PlotterError::Protocol(format!(
                "Unknown opcode {:#04x}",
                other
            ))),
        }
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

//! Frame buffer for splitting a device-bound byte stream into frames.
//!
//! The client writes frames one byte at a time, so the receiving side sees
//! arbitrary fragments. Uses `bytes::BytesMut` and a two-state machine:
//! - `WaitingForLength`: need the first byte
//! - `WaitingForBody`: length known, need `length` more bytes
//!
//! # Example
//!
//! ```
//! use cutter_link::protocol::{Command, FrameBuffer};
//!
//! let wire = Command::Start.encode();
//! let mut buffer = FrameBuffer::new();
//!
//! assert!(buffer.push(&wire.as_bytes()[..2]).unwrap().is_empty());
//! let frames = buffer.push(&wire.as_bytes()[2..]).unwrap();
//! assert_eq!(frames, vec![wire]);
//! ```

use bytes::BytesMut;

use super::CommandFrame;
use crate::error::{PlotterError, Result};

#[derive(Debug, Clone, Copy)]
enum State {
    WaitingForLength,
    WaitingForBody { length: usize },
}

/// Accumulates bytes and extracts complete command frames.
#[derive(Debug)]
pub struct FrameBuffer {
    buffer: BytesMut,
    state: State,
}

impl FrameBuffer {
    /// Create an empty frame buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(64),
            state: State::WaitingForLength,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// # Errors
    ///
    /// Returns a protocol error for a zero length byte. The offending
    /// byte is consumed so the caller can keep feeding data.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<CommandFrame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<CommandFrame>> {
        match self.state {
            State::WaitingForLength => {
                let Some(&length) = self.buffer.first() else {
                    return Ok(None);
                };
                if length == 0 {
                    let _ = self.buffer.split_to(1);
                    return Err(PlotterError::Protocol(
                        "Frame length byte must be non-zero".to_string(),
                    ));
                }
                self.state = State::WaitingForBody {
                    length: length as usize,
                };
                self.try_extract_one()
            }

            State::WaitingForBody { length } => {
                if self.buffer.len() < length + 1 {
                    return Ok(None);
                }
                let raw = self.buffer.split_to(length + 1).freeze();
                self.state = State::WaitingForLength;
                CommandFrame::from_bytes(raw).map(Some)
            }
        }
    }

    /// Number of buffered bytes not yet part of a complete frame.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop buffered bytes and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForLength;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::WaitingForLength => "WaitingForLength",
            State::WaitingForBody { .. } => "WaitingForBody",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, Pen};

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let frame = Command::QueryMat.encode();

        let frames = buffer.push(frame.as_bytes()).unwrap();

        assert_eq!(frames, vec![frame]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let frame = Command::MovePen { pen: Pen::Down, x: 7, y: 9 }.encode();

        let mut all = Vec::new();
        for byte in frame.as_bytes() {
            all.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all, vec![frame]);
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();
        let a = Command::Start.encode();
        let b = Command::MovePen { pen: Pen::Up, x: 1, y: 1 }.encode();
        let c = Command::Stop.encode();

        let mut wire = Vec::new();
        wire.extend_from_slice(a.as_bytes());
        wire.extend_from_slice(b.as_bytes());
        wire.extend_from_slice(c.as_bytes());

        let frames = buffer.push(&wire).unwrap();
        assert_eq!(frames, vec![a, b, c]);
    }

    #[test]
    fn test_partial_body_waits() {
        let mut buffer = FrameBuffer::new();
        let frame = Command::MovePen { pen: Pen::Up, x: 3, y: 4 }.encode();

        assert!(buffer.push(&frame.as_bytes()[..6]).unwrap().is_empty());
        assert_eq!(buffer.state_name(), "WaitingForBody");
        assert_eq!(buffer.len(), 6);

        let frames = buffer.push(&frame.as_bytes()[6..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(buffer.state_name(), "WaitingForLength");
    }

    #[test]
    fn test_zero_length_rejected_and_skipped() {
        let mut buffer = FrameBuffer::new();
        let err = buffer.push(&[0]).unwrap_err();
        assert!(err.to_string().contains("non-zero"));
        assert!(buffer.is_empty());

        let frames = buffer.push(Command::Stop.encode().as_bytes()).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_clear_resets_state() {
        let mut buffer = FrameBuffer::new();
        buffer.push(&[13, 0x40, 1]).unwrap();
        assert_eq!(buffer.state_name(), "WaitingForBody");

        buffer.clear();
        assert_eq!(buffer.state_name(), "WaitingForLength");
        assert!(buffer.is_empty());
    }
}

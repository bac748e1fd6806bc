//! Protocol module - command frames, device-side framing and replies.
//!
//! - Fixed-layout command frames with encrypted pen-move payloads
//! - Frame buffer for splitting a byte stream back into frames
//! - Reply model judged by byte count

mod command;
mod frame_buffer;
mod reply;

pub use command::{
    decrypt_move, encrypt_move, opcode, Command, CommandFrame, Pen, FRAME_HEADER_SIZE,
    MOVE_FRAME_LENGTH, MOVE_MARKER, SHORT_FRAME_LENGTH, STANDARD_REPLY_LEN,
};
pub use frame_buffer::FrameBuffer;
pub use reply::{MatStatus, Reply, ReplyStatus, MAT_LOADED, MAT_STATUS_INDEX};

//! Device replies.
//!
//! Replies carry no length prefix: the caller knows how many bytes each
//! command produces and judges the reply by count alone. The one exception
//! is the mat status query, whose fifth byte holds the answer.

use bytes::Bytes;

/// Index of the status byte in a mat query reply.
pub const MAT_STATUS_INDEX: usize = 4;

/// Status byte value meaning a mat is loaded.
pub const MAT_LOADED: u8 = 1;

/// How a reply wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// Exactly the expected number of bytes arrived.
    Complete,
    /// The deadline fired before the expected count was buffered.
    TimedOut,
    /// The expected count was reached but more bytes were buffered.
    UnexpectedLength,
}

/// Bytes read after a command, plus how the wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    bytes: Bytes,
    expected: usize,
    timed_out: bool,
}

impl Reply {
    pub fn new(bytes: Bytes, expected: usize, timed_out: bool) -> Self {
        Self {
            bytes,
            expected,
            timed_out,
        }
    }

    /// Empty reply for a wait that produced nothing usable.
    pub fn empty(expected: usize, timed_out: bool) -> Self {
        Self::new(Bytes::new(), expected, timed_out)
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte count the caller waited for.
    #[inline]
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Whether the deadline fired during the wait.
    #[inline]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Exactly the expected byte count arrived.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.bytes.len() == self.expected
    }

    pub fn status(&self) -> ReplyStatus {
        if self.is_complete() {
            ReplyStatus::Complete
        } else if self.timed_out {
            ReplyStatus::TimedOut
        } else {
            ReplyStatus::UnexpectedLength
        }
    }
}

/// Interpreted answer to the mat status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatStatus {
    Loaded,
    NotLoaded,
    /// No well-formed reply; carries why.
    NoReply(ReplyStatus),
}

impl MatStatus {
    /// Interpret a mat query reply.
    pub fn from_reply(reply: &Reply) -> Self {
        match reply.status() {
            ReplyStatus::Complete => match reply.bytes().get(MAT_STATUS_INDEX) {
                Some(&MAT_LOADED) => MatStatus::Loaded,
                Some(_) => MatStatus::NotLoaded,
                None => MatStatus::NoReply(ReplyStatus::UnexpectedLength),
            },
            other => MatStatus::NoReply(other),
        }
    }

    #[inline]
    pub fn is_loaded(self) -> bool {
        self == MatStatus::Loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(bytes: &'static [u8], timed_out: bool) -> Reply {
        Reply::new(Bytes::from_static(bytes), 5, timed_out)
    }

    #[test]
    fn test_mat_loaded_only_with_five_bytes_and_flag() {
        assert_eq!(
            MatStatus::from_reply(&reply(&[4, 0x14, 0, 0, 1], false)),
            MatStatus::Loaded
        );
        assert_eq!(
            MatStatus::from_reply(&reply(&[4, 0x14, 0, 0, 0], false)),
            MatStatus::NotLoaded
        );
        assert_eq!(
            MatStatus::from_reply(&reply(&[4, 0x14, 0, 0, 2], false)),
            MatStatus::NotLoaded
        );
    }

    #[test]
    fn test_short_reply_is_not_loaded() {
        let status = MatStatus::from_reply(&reply(&[0, 0, 1], true));
        assert_eq!(status, MatStatus::NoReply(ReplyStatus::TimedOut));
        assert!(!status.is_loaded());
    }

    #[test]
    fn test_empty_reply_is_not_loaded() {
        let status = MatStatus::from_reply(&Reply::empty(5, true));
        assert_eq!(status, MatStatus::NoReply(ReplyStatus::TimedOut));
    }

    #[test]
    fn test_long_reply_is_unexpected_length() {
        let r = reply(&[0, 0, 0, 0, 1, 9], false);
        assert_eq!(r.status(), ReplyStatus::UnexpectedLength);
        assert_eq!(
            MatStatus::from_reply(&r),
            MatStatus::NoReply(ReplyStatus::UnexpectedLength)
        );
    }

    #[test]
    fn test_complete_even_if_deadline_fired() {
        let r = reply(&[1, 2, 3, 4, 5], true);
        assert!(r.is_complete());
        assert_eq!(r.status(), ReplyStatus::Complete);
    }

    #[test]
    fn test_accessors() {
        let r = reply(&[9, 8], false);
        assert_eq!(r.len(), 2);
        assert_eq!(r.expected(), 5);
        assert_eq!(r.bytes(), &[9, 8]);
        assert!(!r.timed_out());
        assert!(!r.is_empty());
    }
}

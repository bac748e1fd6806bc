//! Error types for cutter-link.

use thiserror::Error;

/// Main error type for all plotter and cipher operations.
#[derive(Debug, Error)]
pub enum PlotterError {
    /// Device enumeration returned no devices. The caller may retry.
    #[error("No plotter device found")]
    NoDeviceFound,

    /// Baud rate, timeout or framing setup failed while connecting.
    #[error("Link configuration failed while setting {stage}: {source}")]
    LinkConfiguration {
        /// Which setting was being applied.
        stage: &'static str,
        /// Underlying driver error.
        #[source]
        source: std::io::Error,
    },

    /// Cipher key is not exactly 16 bytes.
    #[error("Invalid key length: expected 16 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// Block buffer is not a multiple of 4 bytes or is shorter than 8 bytes.
    #[error("Invalid payload length {0}: must be a multiple of 4 and at least 8 bytes")]
    InvalidPayloadLength(usize),

    /// Malformed command frame.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Command issued without an open link.
    #[error("Not connected")]
    NotConnected,

    /// `connect` called while a link is already open.
    #[error("Already connected")]
    AlreadyConnected,

    /// I/O error on the device link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlotterError {
    /// Whether the caller can simply try the operation again later.
    ///
    /// Only an empty device list qualifies; every other error needs the
    /// caller to change something first.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PlotterError::NoDeviceFound)
    }
}

/// Result type alias using PlotterError.
pub type Result<T> = std::result::Result<T, PlotterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_payload_length() {
        let err = PlotterError::InvalidPayloadLength(7);
        assert_eq!(
            err.to_string(),
            "Invalid payload length 7: must be a multiple of 4 and at least 8 bytes"
        );
    }

    #[test]
    fn test_display_link_configuration_names_stage() {
        let err = PlotterError::LinkConfiguration {
            stage: "baud rate",
            source: std::io::Error::new(std::io::ErrorKind::Other, "rejected"),
        };
        let msg = err.to_string();
        assert!(msg.contains("baud rate"));
        assert!(msg.contains("rejected"));
    }

    #[test]
    fn test_only_no_device_is_recoverable() {
        assert!(PlotterError::NoDeviceFound.is_recoverable());
        assert!(!PlotterError::NotConnected.is_recoverable());
        assert!(!PlotterError::InvalidKeyLength(3).is_recoverable());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: PlotterError = io.into();
        assert!(matches!(err, PlotterError::Io(_)));
    }
}

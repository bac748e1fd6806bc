//! Client configuration.
//!
//! Defaults match the plotter's USB serial bridge: 200 000 baud, 100 ms
//! driver timeouts, 8N1 framing, and a 10 second reply deadline.
//! All types are serde-enabled so an application can embed them in its
//! own configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::transport::DataFraming;

/// Default baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 200_000;

/// Default driver read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Default driver write timeout.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Default deadline for a command reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between buffered-count checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Serial link parameters applied on connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Serial speed in bits per second.
    pub baud_rate: u32,
    /// Driver-level timeout for a single read.
    pub read_timeout: Duration,
    /// Driver-level timeout for a single write.
    pub write_timeout: Duration,
    /// Character framing, 8N1 by default.
    pub framing: DataFraming,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            framing: DataFraming::EIGHT_N_ONE,
        }
    }
}

/// Full client configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Settings applied to the link on connect.
    pub link: LinkSettings,
    /// How long to wait for a reply before giving up.
    pub reply_timeout: Duration,
    /// Sleep between buffered-count checks. Zero is raised to 1 ms.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            link: LinkSettings::default(),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{DataBits, Parity, StopBits};

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.link.baud_rate, 200_000);
        assert_eq!(config.link.read_timeout, Duration::from_millis(100));
        assert_eq!(config.link.write_timeout, Duration::from_millis(100));
        assert_eq!(config.link.framing, DataFraming::EIGHT_N_ONE);
        assert_eq!(config.reply_timeout, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = ClientConfig::default();
        config.link.framing = DataFraming {
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
        };
        config.reply_timeout = Duration::from_millis(2500);

        let json = serde_json::to_string(&config).unwrap();
        let decoded: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "reply_timeout": { "secs": 2, "nanos": 0 }, "link": { "baud_rate": 9600 } }"#;
        let config: ClientConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.reply_timeout, Duration::from_secs(2));
        assert_eq!(config.link.baud_rate, 9600);
        assert_eq!(config.link.read_timeout, DEFAULT_READ_TIMEOUT);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }
}

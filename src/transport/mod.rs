//! Transport module - the byte link to the plotter.
//!
//! The physical connection (a USB serial bridge) lives outside this crate.
//! It is consumed through two traits:
//! - [`LinkDriver`] enumerates and opens devices
//! - [`TransportLink`] configures and moves bytes over an open device
//!
//! [`sim`] provides an in-memory plotter implementing both.

pub mod sim;

use std::io;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A device reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Position in the enumeration order, as passed to [`LinkDriver::open`].
    pub index: usize,
    /// Serial number or other identifying string.
    pub serial: String,
    /// Human-readable product description from the driver.
    pub description: String,
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataBits {
    Seven,
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    None,
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopBits {
    One,
    Two,
}

/// Character framing of the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFraming {
    /// Data bits per character.
    pub data_bits: DataBits,
    /// Parity bit mode.
    pub parity: Parity,
    /// Stop bits after each character.
    pub stop_bits: StopBits,
}

impl DataFraming {
    /// 8 data bits, no parity, one stop bit.
    pub const EIGHT_N_ONE: DataFraming = DataFraming {
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::One,
    };
}

impl Default for DataFraming {
    fn default() -> Self {
        Self::EIGHT_N_ONE
    }
}

/// Enumerates and opens plotter devices.
pub trait LinkDriver {
    /// Link type produced by [`open`](Self::open).
    type Link: TransportLink;

    /// List attached devices. An empty list means no device is present.
    fn list_devices(&mut self) -> io::Result<Vec<DeviceInfo>>;

    /// Open the device at `index` in the enumeration order.
    fn open(&mut self, index: usize) -> io::Result<Self::Link>;
}

/// An open byte link to one device.
pub trait TransportLink {
    fn set_baud_rate(&mut self, bits_per_second: u32) -> io::Result<()>;

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> io::Result<()>;

    fn set_data_framing(&mut self, framing: DataFraming) -> io::Result<()>;

    /// Write all of `bytes` to the device.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Bytes received and waiting to be read.
    fn buffered_read_count(&mut self) -> io::Result<usize>;

    /// Read up to `count` buffered bytes.
    fn read(&mut self, count: usize) -> io::Result<Bytes>;

    fn close(&mut self) -> io::Result<()>;
}

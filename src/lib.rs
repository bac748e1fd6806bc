//! # cutter-link
//!
//! Client for USB-connected cutting plotters.
//!
//! The plotter speaks a small binary command protocol over a serial link.
//! Pen moves are encrypted with XXTEA under fixed per-command keys; every
//! other command is a plain 5-byte frame. Replies carry no length prefix
//! and are judged by byte count after a deadline-bounded poll.
//!
//! ## Layout
//!
//! - [`cipher`]: XXTEA block transform, counter-mode stream, device keys
//! - [`protocol`]: command frames, frame reassembly, reply interpretation
//! - [`transport`]: link traits and an in-memory simulated plotter
//! - [`config`]: serde-enabled link and timing settings
//!
//! ## Example
//!
//! ```
//! use cutter_link::transport::sim::SimPlotter;
//! use cutter_link::{PlotterClient, SharedClient};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cutter_link::Result<()> {
//! let plotter = SimPlotter::new();
//! let client = SharedClient::new(PlotterClient::new(plotter.driver()));
//!
//! client.connect().await?;
//! client.start().await?;
//! client.move_pen_down(100, 200).await?;
//! client.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

mod client;
mod shared;

pub use client::{ClientBuilder, ConnectionState, PlotterClient};
pub use config::{ClientConfig, LinkSettings};
pub use error::{PlotterError, Result};
pub use shared::SharedClient;

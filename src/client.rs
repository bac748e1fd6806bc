//! Client builder and command/reply cycle.
//!
//! The [`ClientBuilder`] configures link settings and reply timing. The
//! resulting [`PlotterClient`] manages the lifecycle:
//! 1. Enumerate devices and open the first one
//! 2. Apply baud rate, timeouts and framing
//! 3. Send command frames one byte per write
//! 4. Poll the link until the expected reply length arrives or the deadline passes
//!
//! # Example
//!
//! ```
//! use cutter_link::transport::sim::SimPlotter;
//! use cutter_link::ClientBuilder;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cutter_link::Result<()> {
//! let plotter = SimPlotter::new();
//! plotter.set_mat_loaded(true);
//!
//! let mut client = ClientBuilder::new()
//!     .reply_timeout(Duration::from_secs(2))
//!     .build(plotter.driver());
//!
//! client.connect()?;
//! assert!(client.mat_loaded().await?);
//! client.start()?;
//! assert!(client.move_pen_up(100, 200).await?);
//! assert!(client.move_pen_down(300, 200).await?);
//! client.stop()?;
//! client.disconnect()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::error::{PlotterError, Result};
use crate::protocol::{Command, CommandFrame, MatStatus, Pen, Reply, ReplyStatus};
use crate::transport::{DataFraming, DeviceInfo, LinkDriver, TransportLink};

/// Floor for the poll interval.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Builder for configuring and creating a [`PlotterClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the link baud rate.
    ///
    /// Default: 200 000
    pub fn baud_rate(mut self, bits_per_second: u32) -> Self {
        self.config.link.baud_rate = bits_per_second;
        self
    }

    /// Set the driver read/write timeouts.
    ///
    /// Default: 100 ms each
    pub fn link_timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.config.link.read_timeout = read;
        self.config.link.write_timeout = write;
        self
    }

    /// Set the character framing.
    ///
    /// Default: 8N1
    pub fn framing(mut self, framing: DataFraming) -> Self {
        self.config.link.framing = framing;
        self
    }

    /// Set how long to wait for a reply.
    ///
    /// Default: 10 seconds
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.config.reply_timeout = timeout;
        self
    }

    /// Set the sleep between buffered-count checks.
    ///
    /// Default: 5 ms
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Build a disconnected client over `driver`.
    pub fn build<D: LinkDriver>(self, driver: D) -> PlotterClient<D> {
        PlotterClient::with_config(driver, self.config)
    }
}

/// Where the client is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// A command was sent and the client is polling for its reply.
    AwaitingReply,
}

/// Client for one plotter.
///
/// Every command takes `&mut self`, so a single owner can never overlap
/// two commands. Wrap the client in [`SharedClient`](crate::SharedClient)
/// to issue commands from several tasks.
pub struct PlotterClient<D: LinkDriver> {
    driver: D,
    link: Option<D::Link>,
    config: ClientConfig,
    state: ConnectionState,
}

impl<D: LinkDriver> PlotterClient<D> {
    /// Create a client with default settings.
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, ClientConfig::default())
    }

    pub fn with_config(driver: D, config: ClientConfig) -> Self {
        Self {
            driver,
            link: None,
            config,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Open the first attached device and configure the link.
    ///
    /// # Errors
    ///
    /// - [`PlotterError::NoDeviceFound`] if enumeration is empty; retry later
    /// - [`PlotterError::LinkConfiguration`] if a setting is rejected; the
    ///   link is closed again
    /// - [`PlotterError::AlreadyConnected`] if a link is open
    pub fn connect(&mut self) -> Result<DeviceInfo> {
        if self.link.is_some() {
            return Err(PlotterError::AlreadyConnected);
        }

        let device = match self.driver.list_devices()?.into_iter().next() {
            Some(device) => device,
            None => {
                tracing::debug!("Device enumeration returned no devices");
                return Err(PlotterError::NoDeviceFound);
            }
        };

        tracing::debug!(
            index = device.index,
            serial = %device.serial,
            "Opening plotter"
        );
        let mut link = self.driver.open(device.index)?;

        if let Err(e) = configure_link(&mut link, &self.config) {
            tracing::warn!("Link configuration failed: {}", e);
            if let Err(close_err) = link.close() {
                tracing::debug!("Closing half-open link failed: {}", close_err);
            }
            return Err(e);
        }

        self.link = Some(link);
        self.state = ConnectionState::Connected;
        tracing::info!(serial = %device.serial, "Plotter connected");
        Ok(device)
    }

    /// Close the link.
    ///
    /// # Errors
    ///
    /// Returns [`PlotterError::NotConnected`] when no link is open.
    pub fn disconnect(&mut self) -> Result<()> {
        let mut link = self.link.take().ok_or(PlotterError::NotConnected)?;
        self.state = ConnectionState::Disconnected;
        link.close()?;
        tracing::info!("Plotter disconnected");
        Ok(())
    }

    /// Ask whether a mat is loaded, keeping the reason for a missing answer.
    pub async fn mat_status(&mut self) -> Result<MatStatus> {
        let reply = self.request(Command::QueryMat).await?;
        Ok(MatStatus::from_reply(&reply))
    }

    /// True only for a complete reply whose status byte is 1.
    ///
    /// A timeout or malformed reply reads as "not loaded"; use
    /// [`mat_status`](Self::mat_status) to tell them apart.
    pub async fn mat_loaded(&mut self) -> Result<bool> {
        Ok(self.mat_status().await?.is_loaded())
    }

    /// Send the start-cut command. No reply is awaited.
    pub fn start(&mut self) -> Result<()> {
        self.send_frame(&Command::Start.encode())
    }

    /// Send the stop-cut command. No reply is awaited.
    pub fn stop(&mut self) -> Result<()> {
        self.send_frame(&Command::Stop.encode())
    }

    /// Move to `(x, y)` and return the raw acknowledgement.
    pub async fn move_pen(&mut self, pen: Pen, x: u32, y: u32) -> Result<Reply> {
        self.request(Command::MovePen { pen, x, y }).await
    }

    /// Move with the pen raised. True if a 5-byte acknowledgement arrived.
    pub async fn move_pen_up(&mut self, x: u32, y: u32) -> Result<bool> {
        Ok(self.move_pen(Pen::Up, x, y).await?.is_complete())
    }

    /// Move with the pen lowered. True if a 5-byte acknowledgement arrived.
    pub async fn move_pen_down(&mut self, x: u32, y: u32) -> Result<bool> {
        Ok(self.move_pen(Pen::Down, x, y).await?.is_complete())
    }

    /// Send any command and wait for its reply if it has one.
    pub async fn execute(&mut self, command: Command) -> Result<Option<Reply>> {
        match command.expected_reply_len() {
            Some(_) => Ok(Some(self.request(command).await?)),
            None => {
                self.send_frame(&command.encode())?;
                Ok(None)
            }
        }
    }

    async fn request(&mut self, command: Command) -> Result<Reply> {
        let expected = command.expected_reply_len().unwrap_or(0);
        self.send_frame(&command.encode())?;
        self.await_reply(expected).await
    }

    /// Write a frame to the link, one byte per write call.
    pub fn send_frame(&mut self, frame: &CommandFrame) -> Result<()> {
        let link = self.link.as_mut().ok_or(PlotterError::NotConnected)?;
        for byte in frame.as_bytes() {
            link.write(std::slice::from_ref(byte))?;
        }
        tracing::debug!(
            opcode = frame.opcode(),
            len = frame.len(),
            "Sent frame"
        );
        Ok(())
    }

    /// Poll for `expected` reply bytes until the reply deadline.
    ///
    /// Whatever is buffered when the wait ends is read, even if short or
    /// long. A buffered count of one byte or less yields an empty reply.
    pub async fn await_reply(&mut self, expected: usize) -> Result<Reply> {
        let timeout = self.config.reply_timeout;
        let poll = self.config.poll_interval.max(MIN_POLL_INTERVAL);
        let link = self.link.as_mut().ok_or(PlotterError::NotConnected)?;

        let awaiting = AwaitingReplyGuard::enter(&mut self.state);
        let result = poll_reply(link, expected, timeout, poll).await;
        drop(awaiting);

        let reply = result?;
        match reply.status() {
            ReplyStatus::Complete => {
                tracing::debug!(len = reply.len(), "Reply received");
            }
            status => {
                tracing::warn!(
                    expected,
                    received = reply.len(),
                    ?status,
                    "Reply did not match expected length"
                );
            }
        }
        Ok(reply)
    }
}

impl<D: LinkDriver> Drop for PlotterClient<D> {
    fn drop(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.close() {
                tracing::debug!("Closing link on drop failed: {}", e);
            }
        }
    }
}

/// Marks the client as awaiting a reply until dropped.
///
/// Dropping the reply future mid-poll still returns the state to
/// `Connected`; the link stays open.
struct AwaitingReplyGuard<'a> {
    state: &'a mut ConnectionState,
}

impl<'a> AwaitingReplyGuard<'a> {
    fn enter(state: &'a mut ConnectionState) -> Self {
        *state = ConnectionState::AwaitingReply;
        Self { state }
    }
}

impl Drop for AwaitingReplyGuard<'_> {
    fn drop(&mut self) {
        *self.state = ConnectionState::Connected;
    }
}

fn configure_link<L: TransportLink>(link: &mut L, config: &ClientConfig) -> Result<()> {
    let settings = &config.link;
    link.set_baud_rate(settings.baud_rate)
        .map_err(|source| PlotterError::LinkConfiguration {
            stage: "baud rate",
            source,
        })?;
    link.set_timeouts(settings.read_timeout, settings.write_timeout)
        .map_err(|source| PlotterError::LinkConfiguration {
            stage: "timeouts",
            source,
        })?;
    link.set_data_framing(settings.framing)
        .map_err(|source| PlotterError::LinkConfiguration {
            stage: "data framing",
            source,
        })?;
    Ok(())
}

async fn poll_reply<L: TransportLink>(
    link: &mut L,
    expected: usize,
    timeout: Duration,
    poll: Duration,
) -> Result<Reply> {
    let deadline = Instant::now() + timeout;
    let mut timed_out = false;

    loop {
        if link.buffered_read_count()? >= expected {
            break;
        }
        let now = Instant::now();
        if now >= deadline {
            timed_out = true;
            break;
        }
        tokio::time::sleep_until((now + poll).min(deadline)).await;
    }

    let available = link.buffered_read_count()?;
    if available > 1 {
        let bytes = link.read(available)?;
        Ok(Reply::new(bytes, expected, timed_out))
    } else {
        Ok(Reply::empty(expected, timed_out))
    }
}

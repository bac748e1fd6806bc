//! In-memory plotter for tests and demos.
//!
//! [`SimPlotter`] behaves like the real device on the wire: it reassembles
//! frames from whatever byte fragments arrive, decrypts pen moves, and
//! queues 5-byte replies for the status query and moves. Start/stop are
//! not answered. Reply latency, silence, reply length and link faults can
//! be scripted, and everything the device saw is recorded.
//!
//! Time is read from `tokio::time::Instant`, so a paused test runtime
//! controls when delayed replies become visible.
//!
//! # Example
//!
//! ```
//! use cutter_link::transport::sim::SimPlotter;
//! use cutter_link::transport::{LinkDriver, TransportLink};
//!
//! let plotter = SimPlotter::new();
//! plotter.set_mat_loaded(true);
//!
//! let mut driver = plotter.driver();
//! let mut link = driver.open(0).unwrap();
//! link.write(&[4, 0x14, 0, 0, 0]).unwrap();
//!
//! assert_eq!(link.buffered_read_count().unwrap(), 5);
//! assert_eq!(link.read(5).unwrap()[4], 1);
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

use super::{DataFraming, DeviceInfo, LinkDriver, TransportLink};
use crate::protocol::{Command, FrameBuffer, MAT_LOADED, STANDARD_REPLY_LEN};

/// Link setting the simulated driver can be told to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimFault {
    BaudRate,
    Timeouts,
    Framing,
    Write,
    Read,
}

/// Settings the client applied to the simulated link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimLinkSettings {
    /// Last baud rate set, if any.
    pub baud_rate: Option<u32>,
    /// Last `(read, write)` timeouts set, if any.
    pub timeouts: Option<(Duration, Duration)>,
    /// Last framing set, if any.
    pub framing: Option<DataFraming>,
}

#[derive(Debug)]
struct SimState {
    present: bool,
    open: bool,
    open_count: usize,
    close_count: usize,
    mat_loaded: bool,
    silent: bool,
    reply_delay: Duration,
    reply_len: Option<usize>,
    fault: Option<SimFault>,
    settings: SimLinkSettings,
    frames: FrameBuffer,
    rx: VecDeque<(Instant, u8)>,
    written: Vec<u8>,
    write_calls: usize,
    commands: Vec<Command>,
}

impl SimState {
    fn check_fault(&self, at: SimFault) -> io::Result<()> {
        if self.fault == Some(at) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("simulated {:?} fault", at),
            ));
        }
        Ok(())
    }

    fn check_open(&self) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "link closed"));
        }
        Ok(())
    }

    fn receive(&mut self, bytes: &[u8]) {
        self.written.extend_from_slice(bytes);
        self.write_calls += 1;

        let frames = match self.frames.push(bytes) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::trace!("sim plotter dropped bytes: {}", e);
                return;
            }
        };

        for frame in frames {
            match frame.parse() {
                Ok(command) => self.execute(command),
                Err(e) => tracing::trace!("sim plotter ignored frame: {}", e),
            }
        }
    }

    fn execute(&mut self, command: Command) {
        tracing::trace!(?command, "sim plotter received");
        self.commands.push(command);

        let reply = match command {
            Command::QueryMat => {
                let status = if self.mat_loaded { MAT_LOADED } else { 0 };
                [4, command.opcode(), 0, 0, status]
            }
            Command::MovePen { .. } => [4, command.opcode(), 0, 0, 0],
            Command::Start | Command::Stop => return,
        };

        if self.silent {
            return;
        }

        let len = self.reply_len.unwrap_or(STANDARD_REPLY_LEN);
        let ready_at = Instant::now() + self.reply_delay;
        for i in 0..len {
            let byte = reply.get(i).copied().unwrap_or(0);
            self.rx.push_back((ready_at, byte));
        }
    }

    fn ready_count(&self) -> usize {
        let now = Instant::now();
        self.rx.iter().take_while(|(at, _)| *at <= now).count()
    }
}

/// Handle to a simulated plotter. Clones share the same device.
#[derive(Debug, Clone)]
pub struct SimPlotter {
    state: Arc<Mutex<SimState>>,
}

impl SimPlotter {
    /// A present, idle plotter with no mat loaded.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                present: true,
                open: false,
                open_count: 0,
                close_count: 0,
                mat_loaded: false,
                silent: false,
                reply_delay: Duration::ZERO,
                reply_len: None,
                fault: None,
                settings: SimLinkSettings::default(),
                frames: FrameBuffer::new(),
                rx: VecDeque::new(),
                written: Vec::new(),
                write_calls: 0,
                commands: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Driver that enumerates and opens this plotter.
    pub fn driver(&self) -> SimDriver {
        SimDriver {
            plotter: self.clone(),
        }
    }

    /// Whether enumeration reports the device.
    pub fn set_present(&self, present: bool) {
        self.lock().present = present;
    }

    pub fn set_mat_loaded(&self, loaded: bool) {
        self.lock().mat_loaded = loaded;
    }

    /// Stop answering commands.
    pub fn set_silent(&self, silent: bool) {
        self.lock().silent = silent;
    }

    /// Delay before queued replies become readable.
    pub fn set_reply_delay(&self, delay: Duration) {
        self.lock().reply_delay = delay;
    }

    /// Send replies of `len` bytes instead of 5, truncating or zero-padding.
    pub fn set_reply_len(&self, len: Option<usize>) {
        self.lock().reply_len = len;
    }

    /// Make one link operation fail until cleared.
    pub fn set_fault(&self, fault: Option<SimFault>) {
        self.lock().fault = fault;
    }

    /// Queue unsolicited bytes from the device, readable immediately.
    pub fn inject_reply(&self, bytes: &[u8]) {
        let now = Instant::now();
        self.lock().rx.extend(bytes.iter().map(|b| (now, *b)));
    }

    /// Commands decoded so far.
    pub fn commands(&self) -> Vec<Command> {
        self.lock().commands.clone()
    }

    /// Every byte written by the host.
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Number of separate write calls.
    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }

    /// Reply bytes not yet read by the host, including delayed ones.
    pub fn pending_reply_bytes(&self) -> usize {
        self.lock().rx.len()
    }

    pub fn settings(&self) -> SimLinkSettings {
        self.lock().settings
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn open_count(&self) -> usize {
        self.lock().open_count
    }

    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }
}

impl Default for SimPlotter {
    fn default() -> Self {
        Self::new()
    }
}

/// [`LinkDriver`] for a [`SimPlotter`].
#[derive(Debug, Clone)]
pub struct SimDriver {
    plotter: SimPlotter,
}

impl LinkDriver for SimDriver {
    type Link = SimLink;

    fn list_devices(&mut self) -> io::Result<Vec<DeviceInfo>> {
        let state = self.plotter.lock();
        if !state.present {
            return Ok(Vec::new());
        }
        Ok(vec![DeviceInfo {
            index: 0,
            serial: "SIM0001".to_string(),
            description: "Simulated cutting plotter".to_string(),
        }])
    }

    fn open(&mut self, index: usize) -> io::Result<SimLink> {
        let mut state = self.plotter.lock();
        if !state.present || index != 0 {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no device at index {}", index),
            ));
        }
        state.open = true;
        state.open_count += 1;
        state.settings = SimLinkSettings::default();
        state.frames.clear();
        Ok(SimLink {
            plotter: self.plotter.clone(),
        })
    }
}

/// Open link to a [`SimPlotter`].
#[derive(Debug)]
pub struct SimLink {
    plotter: SimPlotter,
}

impl TransportLink for SimLink {
    fn set_baud_rate(&mut self, bits_per_second: u32) -> io::Result<()> {
        let mut state = self.plotter.lock();
        state.check_open()?;
        state.check_fault(SimFault::BaudRate)?;
        state.settings.baud_rate = Some(bits_per_second);
        Ok(())
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> io::Result<()> {
        let mut state = self.plotter.lock();
        state.check_open()?;
        state.check_fault(SimFault::Timeouts)?;
        state.settings.timeouts = Some((read, write));
        Ok(())
    }

    fn set_data_framing(&mut self, framing: DataFraming) -> io::Result<()> {
        let mut state = self.plotter.lock();
        state.check_open()?;
        state.check_fault(SimFault::Framing)?;
        state.settings.framing = Some(framing);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.plotter.lock();
        state.check_open()?;
        state.check_fault(SimFault::Write)?;
        state.receive(bytes);
        Ok(())
    }

    fn buffered_read_count(&mut self) -> io::Result<usize> {
        let state = self.plotter.lock();
        state.check_open()?;
        state.check_fault(SimFault::Read)?;
        Ok(state.ready_count())
    }

    fn read(&mut self, count: usize) -> io::Result<Bytes> {
        let mut state = self.plotter.lock();
        state.check_open()?;
        state.check_fault(SimFault::Read)?;
        let n = count.min(state.ready_count());
        let bytes: Vec<u8> = state.rx.drain(..n).map(|(_, b)| b).collect();
        Ok(Bytes::from(bytes))
    }

    fn close(&mut self) -> io::Result<()> {
        let mut state = self.plotter.lock();
        state.check_open()?;
        state.open = false;
        state.close_count += 1;
        Ok(())
    }
}

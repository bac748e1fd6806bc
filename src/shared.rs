//! Shared handle for issuing commands from several tasks.
//!
//! Each command/reply cycle holds the lock for its whole duration, so
//! replies can never be attributed to the wrong command.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::client::PlotterClient;
use crate::error::Result;
use crate::protocol::{Command, MatStatus, Reply};
use crate::transport::{DeviceInfo, LinkDriver};

/// Cloneable, lock-protected [`PlotterClient`].
pub struct SharedClient<D: LinkDriver> {
    inner: Arc<Mutex<PlotterClient<D>>>,
}

impl<D: LinkDriver> Clone for SharedClient<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: LinkDriver> SharedClient<D> {
    pub fn new(client: PlotterClient<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(client)),
        }
    }

    /// Exclusive access for a sequence of commands.
    pub async fn lock(&self) -> MutexGuard<'_, PlotterClient<D>> {
        self.inner.lock().await
    }

    pub async fn connect(&self) -> Result<DeviceInfo> {
        self.lock().await.connect()
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.lock().await.disconnect()
    }

    pub async fn is_connected(&self) -> bool {
        self.lock().await.is_connected()
    }

    pub async fn execute(&self, command: Command) -> Result<Option<Reply>> {
        self.lock().await.execute(command).await
    }

    pub async fn mat_status(&self) -> Result<MatStatus> {
        self.lock().await.mat_status().await
    }

    pub async fn mat_loaded(&self) -> Result<bool> {
        self.lock().await.mat_loaded().await
    }

    pub async fn start(&self) -> Result<()> {
        self.lock().await.start()
    }

    pub async fn stop(&self) -> Result<()> {
        self.lock().await.stop()
    }

    pub async fn move_pen_up(&self, x: u32, y: u32) -> Result<bool> {
        self.lock().await.move_pen_up(x, y).await
    }

    pub async fn move_pen_down(&self, x: u32, y: u32) -> Result<bool> {
        self.lock().await.move_pen_down(x, y).await
    }
}

impl<D: LinkDriver> From<PlotterClient<D>> for SharedClient<D> {
    fn from(client: PlotterClient<D>) -> Self {
        Self::new(client)
    }
}

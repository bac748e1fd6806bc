//! Plot Square - full cut session against the simulated plotter.
//!
//! This example demonstrates:
//! - Building a client with custom reply timing
//! - Checking for a loaded mat before cutting
//! - Cutting a square with pen-down moves
//! - Reading back what the device received
//!
//! Logs at debug level, so every frame and reply is printed:
//!
//! ```text
//! cargo run --example plot_square
//! ```

use std::time::Duration;

use cutter_link::transport::sim::SimPlotter;
use cutter_link::ClientBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let plotter = SimPlotter::new();
    plotter.set_mat_loaded(true);
    plotter.set_reply_delay(Duration::from_millis(15));

    let mut client = ClientBuilder::new()
        .reply_timeout(Duration::from_secs(2))
        .poll_interval(Duration::from_millis(2))
        .build(plotter.driver());

    let device = client.connect()?;
    println!("connected to {} ({})", device.serial, device.description);

    if !client.mat_loaded().await? {
        println!("no mat loaded, nothing to cut");
        client.disconnect()?;
        return Ok(());
    }

    let side = 2_000;
    let (ox, oy) = (500, 500);

    client.start()?;
    client.move_pen_up(ox, oy).await?;
    for (x, y) in [
        (ox + side, oy),
        (ox + side, oy + side),
        (ox, oy + side),
        (ox, oy),
    ] {
        if !client.move_pen_down(x, y).await? {
            println!("move to ({}, {}) was not acknowledged", x, y);
        }
    }
    client.move_pen_up(0, 0).await?;
    client.stop()?;
    client.disconnect()?;

    println!("device received {} commands:", plotter.commands().len());
    for command in plotter.commands() {
        println!("  {:?}", command);
    }

    Ok(())
}

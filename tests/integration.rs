//! Integration tests for cutter-link.
//!
//! These drive a `PlotterClient` against the simulated plotter and check
//! what reaches the wire.

use std::time::Duration;

use cutter_link::cipher::keys::{PEN_DOWN_KEY, PEN_UP_KEY};
use cutter_link::cipher::{BlockCipher, CounterCipher, Xxtea};
use cutter_link::protocol::{
    decrypt_move, opcode, Command, FrameBuffer, MatStatus, Pen, ReplyStatus, MOVE_MARKER,
};
use cutter_link::transport::sim::{SimFault, SimPlotter};
use cutter_link::{
    ClientBuilder, ClientConfig, ConnectionState, PlotterClient, PlotterError, SharedClient,
};

fn connected(plotter: &SimPlotter) -> PlotterClient<cutter_link::transport::sim::SimDriver> {
    let mut client = PlotterClient::new(plotter.driver());
    client.connect().unwrap();
    client
}

/// Pen-up move at (100, 200) produces a 14-byte frame whose payload
/// decrypts back to the marker and coordinates.
#[tokio::test(start_paused = true)]
async fn test_pen_up_move_on_the_wire() {
    let plotter = SimPlotter::new();
    let mut client = connected(&plotter);

    assert!(client.move_pen_up(100, 200).await.unwrap());

    let wire = plotter.written();
    assert_eq!(wire.len(), 14);
    assert_eq!(&wire[..2], &[13, opcode::MOVE_PEN]);
    assert_eq!(
        &wire[2..],
        &[0x88, 0x5c, 0xeb, 0xf5, 0x84, 0x5e, 0x29, 0x60, 0x74, 0xb6, 0x35, 0x2b]
    );
    assert_eq!(
        decrypt_move(&PEN_UP_KEY, &wire[2..]).unwrap(),
        [MOVE_MARKER, 100, 200]
    );
    assert_eq!(plotter.write_calls(), 14);
}

#[tokio::test(start_paused = true)]
async fn test_pen_down_uses_its_own_key() {
    let plotter = SimPlotter::new();
    let mut client = connected(&plotter);

    assert!(client.move_pen_down(100, 200).await.unwrap());

    let wire = plotter.written();
    assert_eq!(
        &wire[2..],
        &[0xc7, 0x16, 0xa5, 0x0a, 0x21, 0x59, 0x08, 0xee, 0x6c, 0x24, 0x90, 0xe1]
    );
    assert_eq!(
        decrypt_move(&PEN_DOWN_KEY, &wire[2..]).unwrap(),
        [MOVE_MARKER, 100, 200]
    );
    assert_ne!(
        decrypt_move(&PEN_UP_KEY, &wire[2..]).unwrap()[0],
        MOVE_MARKER
    );
}

#[tokio::test(start_paused = true)]
async fn test_mat_loaded_depends_on_status_byte() {
    let plotter = SimPlotter::new();
    let mut client = connected(&plotter);

    assert!(!client.mat_loaded().await.unwrap());
    plotter.set_mat_loaded(true);
    assert!(client.mat_loaded().await.unwrap());
    assert_eq!(client.mat_status().await.unwrap(), MatStatus::Loaded);

    assert_eq!(&plotter.written()[..5], &[4, opcode::QUERY_MAT, 0, 0, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_mat_loaded_false_on_wrong_length() {
    let plotter = SimPlotter::new();
    plotter.set_mat_loaded(true);
    plotter.set_reply_len(Some(6));
    let mut client = connected(&plotter);

    assert_eq!(
        client.mat_status().await.unwrap(),
        MatStatus::NoReply(ReplyStatus::UnexpectedLength)
    );
    assert!(!client.mat_loaded().await.unwrap());
}

/// A silent device costs the full reply deadline and yields an empty reply.
#[tokio::test(start_paused = true)]
async fn test_silent_device_hits_deadline() {
    let plotter = SimPlotter::new();
    plotter.set_silent(true);
    let mut client = ClientBuilder::new()
        .reply_timeout(Duration::from_secs(2))
        .build(plotter.driver());
    client.connect().unwrap();

    let started = tokio::time::Instant::now();
    let reply = client.move_pen(Pen::Up, 1, 1).await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert!(reply.is_empty());
    assert_eq!(reply.status(), ReplyStatus::TimedOut);
    assert!(!client.move_pen_down(1, 1).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_full_cut_session() {
    let plotter = SimPlotter::new();
    plotter.set_mat_loaded(true);
    plotter.set_reply_delay(Duration::from_millis(20));
    let mut client = connected(&plotter);

    assert!(client.mat_loaded().await.unwrap());
    client.start().unwrap();
    for (x, y) in [(0, 0), (1000, 0), (1000, 1000), (0, 1000), (0, 0)] {
        assert!(client.move_pen_down(x, y).await.unwrap());
    }
    assert!(client.move_pen_up(0, 0).await.unwrap());
    client.stop().unwrap();
    client.disconnect().unwrap();

    let commands = plotter.commands();
    assert_eq!(commands.first(), Some(&Command::QueryMat));
    assert_eq!(commands[1], Command::Start);
    assert_eq!(commands.last(), Some(&Command::Stop));
    assert_eq!(commands.len(), 9);
    assert_eq!(
        commands[4],
        Command::MovePen {
            pen: Pen::Down,
            x: 1000,
            y: 1000
        }
    );
    assert!(!plotter.is_open());
}

/// Every byte the client writes reassembles into the commands it sent.
#[tokio::test(start_paused = true)]
async fn test_wire_stream_reassembles() {
    let plotter = SimPlotter::new();
    let mut client = connected(&plotter);

    client.start().unwrap();
    client.move_pen_down(5, 6).await.unwrap();
    client.stop().unwrap();

    let mut buffer = FrameBuffer::new();
    let frames = buffer.push(&plotter.written()).unwrap();
    let parsed: Vec<Command> = frames.iter().map(|f| f.parse().unwrap()).collect();
    assert_eq!(
        parsed,
        vec![
            Command::Start,
            Command::MovePen {
                pen: Pen::Down,
                x: 5,
                y: 6
            },
            Command::Stop
        ]
    );
}

#[test]
fn test_reconnect_after_device_appears() {
    let plotter = SimPlotter::new();
    plotter.set_present(false);
    let mut client = PlotterClient::new(plotter.driver());

    for _ in 0..3 {
        let err = client.connect().unwrap_err();
        assert!(err.is_recoverable());
    }

    plotter.set_present(true);
    let device = client.connect().unwrap();
    assert_eq!(device.serial, "SIM0001");
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[test]
fn test_each_configuration_stage_reports_failure() {
    for (fault, stage) in [
        (SimFault::BaudRate, "baud rate"),
        (SimFault::Timeouts, "timeouts"),
        (SimFault::Framing, "data framing"),
    ] {
        let plotter = SimPlotter::new();
        plotter.set_fault(Some(fault));
        let mut client = PlotterClient::new(plotter.driver());

        match client.connect() {
            Err(PlotterError::LinkConfiguration { stage: got, .. }) => assert_eq!(got, stage),
            other => panic!("expected configuration error, got {:?}", other.map(|d| d.index)),
        }
        assert!(!plotter.is_open());
    }
}

#[test]
fn test_config_from_json_applies_to_link() {
    let config: ClientConfig =
        serde_json::from_str(r#"{ "link": { "baud_rate": 115200 } }"#).unwrap();
    let plotter = SimPlotter::new();
    let mut client = ClientBuilder::new().config(config).build(plotter.driver());

    client.connect().unwrap();
    assert_eq!(plotter.settings().baud_rate, Some(115_200));
}

#[tokio::test(start_paused = true)]
async fn test_shared_client_across_tasks() {
    let plotter = SimPlotter::new();
    plotter.set_reply_delay(Duration::from_millis(10));
    let shared = SharedClient::new(connected(&plotter));

    let handles: Vec<_> = (1..=3u32)
        .map(|i| {
            let client = shared.clone();
            tokio::spawn(async move { client.move_pen_down(i * 10, i * 20).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }
    assert_eq!(plotter.commands().len(), 3);
}

#[test]
fn test_block_and_stream_ciphers_share_a_key() {
    let cipher = Xxtea::from_key_bytes(b"1234567887654321").unwrap();
    let block = cipher.encrypt_block(b"abcd1234").unwrap();
    assert_eq!(
        block,
        [0xc3, 0x20, 0xc8, 0xf0, 0x41, 0x72, 0x8a, 0xbd]
    );
    assert_eq!(cipher.decrypt_block(&block).unwrap(), b"abcd1234");

    let mut sender = CounterCipher::with_iv(cipher.clone(), 7);
    let mut receiver = CounterCipher::with_iv(cipher, 7);
    let message = b"cut along the dotted line";
    let sealed = sender.encrypt(message);
    assert_eq!(receiver.decrypt(&sealed), message);
}

//! Drain both packet queues from a fixed-rate loop, the way a game client would.
//!
//! Run with:
//!   cargo run --example game-loop -- 127.0.0.1:7777
//!
//! Any server that speaks length-prefixed packets works; for a quick test,
//! `printf '\x01\x00\x02hi\x8f\x00\x00' | nc -l 7777` sends one game and one
//! system packet.

use std::time::Duration;

use gamelink::frame::packet_name;
use gamelink::session::{ConnectionState, Session, SessionConfig, SessionError};

const TICK: Duration = Duration::from_millis(16);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7777".to_string());

    let mut session = Session::new();
    session.initialize(SessionConfig::default(), &address)?;
    eprintln!("Connected from {}", session.local_address()?);

    let mut buf = vec![0u8; 512];
    loop {
        let connected = session.state() == ConnectionState::Connected;

        while let Some(packet) = session.recv_system_packet() {
            eprintln!("system: {}", packet_name(packet.type_id()));
        }

        loop {
            match session.dequeue_game_packet(&mut buf) {
                Ok(0) => break,
                Ok(n) => eprintln!("game: type 0x{:02X}, {n} bytes", buf[0]),
                Err(SessionError::BufferTooSmall { required, .. }) => buf.resize(required, 0),
                Err(err) => return Err(err.into()),
            }
        }

        if !connected {
            break;
        }
        std::thread::sleep(TICK);
    }

    if let Some(reason) = session.disconnect_reason() {
        eprintln!("Disconnected: {reason}");
    }
    session.release();
    Ok(())
}

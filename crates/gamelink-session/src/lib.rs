//! Game-server connection session.
//!
//! A [`Session`] owns one TCP connection. A background thread turns the
//! incoming byte stream into packets and sorts them into a bounded game
//! queue and a bounded system queue; the game loop drains both without
//! blocking and sends pre-framed bytes back on the same socket.

mod connector;
mod receiver;

pub mod config;
pub mod error;
pub mod queue;
pub mod session;
pub mod status;

pub use config::{SessionConfig, DEFAULT_GAME_QUEUE_CAPACITY, DEFAULT_SYSTEM_QUEUE_CAPACITY};
pub use error::{Result, SessionError};
pub use queue::{DualQueue, PacketQueue};
pub use session::Session;
pub use status::{ConnectionState, DisconnectReason, SessionStats};

//! Client-side transport for real-time game servers.
//!
//! gamelink connects to a game server over TCP, turns the incoming byte
//! stream into complete packets, and sorts them into a game queue and a
//! system queue that the game loop drains without blocking.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connect and socket options
//! - [`frame`]: Byte buffer, packet framing, and channel classification
//! - [`session`]: Connection session with a background receive loop (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use gamelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use gamelink_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use gamelink_session::*;
}

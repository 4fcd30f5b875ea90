//! TCP transport for gamelink.
//!
//! This is the lowest layer of gamelink. It resolves a server address, opens
//! a TCP connection with a bounded connect timeout and hands back a
//! [`GameStream`]. Everything else builds on top of that type.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::GameStream;
pub use tcp::{connect, DEFAULT_CONNECT_TIMEOUT};

use std::time::Duration;

use gamelink_frame::{Classifier, Framer, FramerConfig, DEFAULT_READ_CHUNK_SIZE, SYSTEM_PACKET_TYPES};
use gamelink_transport::DEFAULT_CONNECT_TIMEOUT;

/// Default game-channel queue bound.
pub const DEFAULT_GAME_QUEUE_CAPACITY: usize = 1024;

/// Default system-channel queue bound.
pub const DEFAULT_SYSTEM_QUEUE_CAPACITY: usize = 256;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Wire protocol variant and maximum packet size.
    pub framing: FramerConfig,
    /// Packet types routed to the system channel.
    pub system_types: Vec<u8>,
    /// Maximum packets held in the game queue before the oldest is evicted.
    pub game_queue_capacity: usize,
    /// Maximum packets held in the system queue before the oldest is evicted.
    pub system_queue_capacity: usize,
    /// Time allowed to establish the TCP connection.
    pub connect_timeout: Duration,
    /// Write timeout for `send`. `None` blocks as long as the socket does.
    pub write_timeout: Option<Duration>,
    /// Size of a single socket read in the receive loop.
    pub read_chunk_size: usize,
    /// Disable Nagle's algorithm on the socket.
    pub nodelay: bool,
    /// Enable TCP keepalive probes on the socket.
    pub keepalive: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            framing: FramerConfig::default(),
            system_types: SYSTEM_PACKET_TYPES.to_vec(),
            game_queue_capacity: DEFAULT_GAME_QUEUE_CAPACITY,
            system_queue_capacity: DEFAULT_SYSTEM_QUEUE_CAPACITY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: None,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            nodelay: true,
            keepalive: false,
        }
    }
}

impl SessionConfig {
    pub(crate) fn framer(&self) -> Framer {
        Framer::new(&self.framing)
    }

    pub(crate) fn classifier(&self) -> Classifier {
        Classifier::new(&self.system_types)
    }
}

//! Game/system channel classification.
//!
//! The server interleaves two logical streams on one socket. A small, known
//! set of packet types carries connection-level system traffic; every other
//! type is game traffic.

use std::fmt;

/// Keepalive / latency probe.
pub const KEEPALIVE: u8 = 0x8F;

/// Connection parameters announced by the server.
pub const CONNECTION_INFO: u8 = 0xAE;

/// Server accepted the connection.
pub const CONNECTION_ACCEPTED: u8 = 0xAF;

/// Server is terminating the connection.
pub const CONNECTION_TERMINATED: u8 = 0xB0;

/// Out-of-band server notice.
pub const SERVER_NOTICE: u8 = 0xB1;

/// Packet types routed to the system channel by default.
pub const SYSTEM_PACKET_TYPES: [u8; 5] = [
    KEEPALIVE,
    CONNECTION_INFO,
    CONNECTION_ACCEPTED,
    CONNECTION_TERMINATED,
    SERVER_NOTICE,
];

/// Logical packet channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Game,
    System,
}

impl Channel {
    /// Lowercase channel name, used in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Game => "game",
            Channel::System => "system",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps packet type identifiers to channels with a fixed membership table.
#[derive(Clone, PartialEq, Eq)]
pub struct Classifier {
    system: [bool; 256],
}

impl Classifier {
    /// Classifier with an explicit system type set. All other types are game.
    pub fn new(system_types: &[u8]) -> Self {
        let mut system = [false; 256];
        for type_id in system_types {
            system[usize::from(*type_id)] = true;
        }
        Self { system }
    }

    /// Channel for a packet type. Total: every type maps to exactly one channel.
    pub fn classify(&self, type_id: u8) -> Channel {
        if self.system[usize::from(type_id)] {
            Channel::System
        } else {
            Channel::Game
        }
    }

    /// The system type set, ascending.
    pub fn system_types(&self) -> Vec<u8> {
        (0..=u8::MAX)
            .filter(|type_id| self.system[usize::from(*type_id)])
            .collect()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&SYSTEM_PACKET_TYPES)
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("system_types", &self.system_types())
            .finish()
    }
}

/// Returns a human-readable name for a well-known packet type.
pub fn packet_name(type_id: u8) -> &'static str {
    match type_id {
        KEEPALIVE => "KEEPALIVE",
        CONNECTION_INFO => "CONNECTION_INFO",
        CONNECTION_ACCEPTED => "CONNECTION_ACCEPTED",
        CONNECTION_TERMINATED => "CONNECTION_TERMINATED",
        SERVER_NOTICE => "SERVER_NOTICE",
        _ => "GAME",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_system_set() {
        let classifier = Classifier::default();
        for type_id in SYSTEM_PACKET_TYPES {
            assert_eq!(classifier.classify(type_id), Channel::System);
        }
        assert_eq!(classifier.system_types(), SYSTEM_PACKET_TYPES.to_vec());
    }

    #[test]
    fn everything_else_is_game() {
        let classifier = Classifier::default();
        let game = (0..=u8::MAX)
            .filter(|t| classifier.classify(*t) == Channel::Game)
            .count();
        assert_eq!(game, 256 - SYSTEM_PACKET_TYPES.len());
        assert_eq!(classifier.classify(0x01), Channel::Game);
    }

    #[test]
    fn custom_system_set() {
        let classifier = Classifier::new(&[0x00, 0xFF]);
        assert_eq!(classifier.classify(0x00), Channel::System);
        assert_eq!(classifier.classify(0xFF), Channel::System);
        assert_eq!(classifier.classify(KEEPALIVE), Channel::Game);
    }

    #[test]
    fn empty_system_set_routes_all_to_game() {
        let classifier = Classifier::new(&[]);
        assert!((0..=u8::MAX).all(|t| classifier.classify(t) == Channel::Game));
    }

    #[test]
    fn names() {
        assert_eq!(packet_name(KEEPALIVE), "KEEPALIVE");
        assert_eq!(packet_name(0x01), "GAME");
        assert_eq!(Channel::System.to_string(), "system");
    }
}

//! Connection state and counters shared between a session and its
//! receive thread.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

use gamelink_frame::{Channel, Corruption};

/// Lifecycle state of a session's connection.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Closing = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Closing,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the most recent connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `release` was called.
    Released,
    /// The server closed the connection.
    PeerClosed,
    /// The byte stream could not be framed.
    CorruptStream(Corruption),
    /// A socket read failed.
    ReadFailed(String),
    /// A socket write failed.
    SendFailed(String),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::Released => f.write_str("released"),
            DisconnectReason::PeerClosed => f.write_str("peer closed the connection"),
            DisconnectReason::CorruptStream(c) => write!(f, "corrupt stream: {c}"),
            DisconnectReason::ReadFailed(e) => write!(f, "read failed: {e}"),
            DisconnectReason::SendFailed(e) => write!(f, "send failed: {e}"),
        }
    }
}

/// Point-in-time session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub game_packets: u64,
    pub system_packets: u64,
    pub game_evicted: u64,
    pub system_evicted: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Status {
    state: AtomicU8,
    reason: Mutex<Option<DisconnectReason>>,
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
    game_packets: AtomicU64,
    system_packets: AtomicU64,
}

impl Status {
    pub(crate) fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.state() == ConnectionState::Closing
    }

    /// Record why the connection ended. The first reason recorded wins.
    pub(crate) fn record_reason(&self, reason: DisconnectReason) {
        let mut slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(reason);
        }
    }

    pub(crate) fn clear_reason(&self) {
        *self.reason.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub(crate) fn reason(&self) -> Option<DisconnectReason> {
        self.reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn add_received(&self, bytes: usize) {
        self.bytes_received
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn add_sent(&self, bytes: usize) {
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn count_packet(&self, channel: Channel) {
        let counter = match channel {
            Channel::Game => &self.game_packets,
            Channel::System => &self.system_packets,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, game_evicted: u64, system_evicted: u64) -> SessionStats {
        SessionStats {
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            game_packets: self.game_packets.load(Ordering::Relaxed),
            system_packets: self.system_packets.load(Ordering::Relaxed),
            game_evicted,
            system_evicted,
        }
    }
}

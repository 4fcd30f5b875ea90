use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use gamelink_frame::{Channel, Framer, Packet, PacketWriter};
use gamelink_transport::GameStream;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::connector;
use crate::error::{Result, SessionError};
use crate::queue::DualQueue;
use crate::receiver::Receiver;
use crate::status::{ConnectionState, DisconnectReason, SessionStats, Status};

/// The live half of a connection owned by the session.
struct Link {
    writer: Mutex<PacketWriter<GameStream>>,
    local_addr: SocketAddr,
    receiver: Option<JoinHandle<()>>,
}

/// A client connection to one game server.
///
/// A background thread reads the socket and sorts complete packets into a
/// game queue and a system queue. The game loop drains each queue at its
/// own pace with [`Session::dequeue_game_packet`] and
/// [`Session::dequeue_system_packet`], and writes with [`Session::send`].
///
/// Queued packets survive a disconnect; they are discarded only when the
/// session is initialized again.
pub struct Session {
    config: SessionConfig,
    framer: Framer,
    queues: Arc<DualQueue>,
    status: Arc<Status>,
    link: Option<Link>,
    server_address: Option<String>,
    initialized: bool,
}

impl Session {
    /// A session with default configuration, not yet connected.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// A session with explicit configuration, not yet connected.
    pub fn with_config(config: SessionConfig) -> Self {
        let queues = Arc::new(DualQueue::new(
            config.game_queue_capacity,
            config.system_queue_capacity,
        ));
        Self {
            framer: config.framer(),
            config,
            queues,
            status: Arc::new(Status::default()),
            link: None,
            server_address: None,
            initialized: false,
        }
    }

    /// Apply `config`, reset both queues, and connect to `address`.
    ///
    /// Fails with [`SessionError::AlreadyInitialized`] until [`Session::release`]
    /// is called. A failed connect leaves the session uninitialized.
    pub fn initialize(&mut self, config: SessionConfig, address: &str) -> Result<()> {
        if self.initialized || self.status.state() != ConnectionState::Disconnected {
            return Err(SessionError::AlreadyInitialized);
        }

        self.reap();
        self.queues = Arc::new(DualQueue::new(
            config.game_queue_capacity,
            config.system_queue_capacity,
        ));
        self.framer = config.framer();
        self.config = config;

        self.connect(address)?;
        self.initialized = true;
        Ok(())
    }

    /// Connect to `address` with the current configuration.
    ///
    /// Packets already queued from an earlier connection are kept. Fails with
    /// [`SessionError::AlreadyInitialized`] while a connection is live.
    pub fn connect(&mut self, address: &str) -> Result<()> {
        if self.status.state() != ConnectionState::Disconnected {
            return Err(SessionError::AlreadyInitialized);
        }
        self.reap();

        self.status.set_state(ConnectionState::Connecting);
        self.status.clear_reason();
        info!(%address, "connecting to game server");

        let conn = match connector::open(address, &self.config) {
            Ok(conn) => conn,
            Err(err) => {
                warn!(%address, error = %err, "connect failed");
                self.status.set_state(ConnectionState::Disconnected);
                return Err(err);
            }
        };

        // Connected must be visible before the receive loop can observe a close.
        self.status.set_state(ConnectionState::Connected);
        let receiver = Receiver::new(
            conn.reader,
            self.config.classifier(),
            Arc::clone(&self.queues),
            Arc::clone(&self.status),
        );
        let handle = match receiver.spawn() {
            Ok(handle) => handle,
            Err(err) => {
                let _ = conn.writer.get_ref().shutdown();
                self.status.set_state(ConnectionState::Disconnected);
                return Err(SessionError::Frame(err.into()));
            }
        };

        info!(%address, local = %conn.local_addr, "connected");
        self.server_address = Some(address.to_string());
        self.link = Some(Link {
            writer: Mutex::new(conn.writer),
            local_addr: conn.local_addr,
            receiver: Some(handle),
        });
        Ok(())
    }

    /// Close the connection and stop the receive thread.
    ///
    /// Idempotent. Once this returns no further packets are queued. Packets
    /// already queued stay available to the dequeue calls.
    pub fn release(&mut self) {
        self.initialized = false;
        let Some(mut link) = self.link.take() else {
            return;
        };

        self.status.record_reason(DisconnectReason::Released);
        self.status.set_state(ConnectionState::Closing);
        {
            let writer = link.writer.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = writer.get_ref().shutdown() {
                debug!(error = %err, "socket shutdown on release failed");
            }
        }
        if let Some(handle) = link.receiver.take() {
            if handle.join().is_err() {
                warn!("receive thread panicked");
            }
        }
        self.status.set_state(ConnectionState::Disconnected);
        info!(reason = ?self.status.reason(), "session released");
    }

    /// Write pre-framed bytes to the server (blocking). Returns the byte count.
    ///
    /// A write failure closes the connection and returns
    /// [`SessionError::SendFailed`].
    pub fn send(&self, bytes: &[u8]) -> Result<usize> {
        let link = self.connected_link()?;
        let mut writer = link.writer.lock().unwrap_or_else(PoisonError::into_inner);

        match writer.write_raw(bytes) {
            Ok(n) => {
                self.status.add_sent(n);
                Ok(n)
            }
            Err(err) => {
                self.fail_send(&writer, &err);
                Err(SessionError::SendFailed(err))
            }
        }
    }

    /// Frame `payload` as a packet of `type_id` and write it.
    pub fn send_packet(&self, type_id: u8, payload: &[u8]) -> Result<usize> {
        let packet = self.framer.packet(type_id, payload)?;
        self.send(packet.wire())
    }

    /// Copy the next game packet into `buf`. Returns 0 if none is queued.
    pub fn dequeue_game_packet(&self, buf: &mut [u8]) -> Result<usize> {
        self.queues.dequeue(Channel::Game, buf)
    }

    /// Copy the next system packet into `buf`. Returns 0 if none is queued.
    pub fn dequeue_system_packet(&self, buf: &mut [u8]) -> Result<usize> {
        self.queues.dequeue(Channel::System, buf)
    }

    /// Take the next game packet without copying.
    pub fn recv_game_packet(&self) -> Option<Packet> {
        self.queues.try_recv(Channel::Game)
    }

    /// Take the next system packet without copying.
    pub fn recv_system_packet(&self) -> Option<Packet> {
        self.queues.try_recv(Channel::System)
    }

    /// Number of packets waiting on a channel.
    pub fn pending(&self, channel: Channel) -> usize {
        self.queues.queue(channel).len()
    }

    /// Local endpoint of the connected socket.
    pub fn local_address(&self) -> Result<SocketAddr> {
        Ok(self.connected_link()?.local_addr)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.status.state()
    }

    /// True while the connection is up.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Why the most recent connection ended, if it has.
    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        match self.state() {
            ConnectionState::Connected | ConnectionState::Connecting => None,
            _ => self.status.reason(),
        }
    }

    /// Traffic and queue counters.
    pub fn stats(&self) -> SessionStats {
        self.status.snapshot(
            self.queues.queue(Channel::Game).evicted(),
            self.queues.queue(Channel::System).evicted(),
        )
    }

    /// Address given to the most recent successful connect.
    pub fn server_address(&self) -> Option<&str> {
        self.server_address.as_deref()
    }

    /// Active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn connected_link(&self) -> Result<&Link> {
        match (&self.link, self.status.state()) {
            (Some(link), ConnectionState::Connected) => Ok(link),
            _ => Err(SessionError::NotConnected),
        }
    }

    fn fail_send(&self, writer: &PacketWriter<GameStream>, err: &gamelink_frame::FrameError) {
        warn!(error = %err, "send failed; closing connection");
        self.status
            .record_reason(DisconnectReason::SendFailed(err.to_string()));
        self.status.set_state(ConnectionState::Closing);
        // Wakes the receive loop, which finishes the transition to Disconnected.
        let _ = writer.get_ref().shutdown();
    }

    /// Join the receive thread of a connection that already ended on its own.
    fn reap(&mut self) {
        if let Some(mut link) = self.link.take() {
            let _ = link.writer.get_mut().map(|w| w.get_ref().shutdown());
            if let Some(handle) = link.receiver.take() {
                let _ = handle.join();
            }
            self.status.set_state(ConnectionState::Disconnected);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("server_address", &self.server_address)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

//! Background receive loop.
//!
//! One thread per connection reads the socket, frames the byte stream into
//! packets, and routes each packet into its channel queue. The thread exits
//! when the peer closes, the stream is corrupt, a read fails, or the session
//! shuts the socket down.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use gamelink_frame::{packet_name, Classifier, FrameError, Packet, PacketReader};
use gamelink_transport::GameStream;
use tracing::{debug, trace, warn};

use crate::queue::DualQueue;
use crate::status::{ConnectionState, DisconnectReason, Status};

const THREAD_NAME: &str = "gamelink-recv";

pub(crate) struct Receiver {
    reader: PacketReader<GameStream>,
    classifier: Classifier,
    queues: Arc<DualQueue>,
    status: Arc<Status>,
}

impl Receiver {
    pub(crate) fn new(
        reader: PacketReader<GameStream>,
        classifier: Classifier,
        queues: Arc<DualQueue>,
        status: Arc<Status>,
    ) -> Self {
        Self {
            reader,
            classifier,
            queues,
            status,
        }
    }

    pub(crate) fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        let reason = self.receive();
        debug!(%reason, "receive loop finished");

        self.status.record_reason(reason);
        self.status.set_state(ConnectionState::Closing);
        if let Err(err) = self.reader.get_ref().shutdown() {
            debug!(error = %err, "socket shutdown after receive loop failed");
        }
        self.status.set_state(ConnectionState::Disconnected);
    }

    fn receive(&mut self) -> DisconnectReason {
        loop {
            match self.reader.fill() {
                Ok(n) => self.status.add_received(n),
                Err(err) => return self.read_error(err),
            }

            // Bytes that arrive after release has begun are discarded.
            if self.status.is_closing() {
                return DisconnectReason::Released;
            }

            let Self {
                reader,
                classifier,
                queues,
                status,
            } = &mut *self;
            let drained = reader.drain(|packet| route(classifier, queues, status, packet));

            if let Err(err) = drained {
                return self.read_error(err);
            }
        }
    }

    fn read_error(&self, err: FrameError) -> DisconnectReason {
        if self.status.is_closing() {
            return DisconnectReason::Released;
        }
        match err {
            FrameError::ConnectionClosed => DisconnectReason::PeerClosed,
            FrameError::CorruptStream(corruption) => {
                warn!(%corruption, "corrupt packet stream; closing connection");
                DisconnectReason::CorruptStream(corruption)
            }
            other => {
                warn!(error = %other, "socket read failed; closing connection");
                DisconnectReason::ReadFailed(other.to_string())
            }
        }
    }
}

/// Classify `packet` and queue it on its channel.
///
/// Once teardown has begun, packets still being drained from the last read
/// are dropped instead of queued.
fn route(classifier: &Classifier, queues: &DualQueue, status: &Status, packet: Packet) {
    if status.is_closing() {
        trace!(type_id = packet.type_id(), "session closing; packet discarded");
        return;
    }

    let channel = classifier.classify(packet.type_id());
    status.count_packet(channel);
    trace!(
        type_id = packet.type_id(),
        name = packet_name(packet.type_id()),
        size = packet.wire_size(),
        %channel,
        "packet received"
    );
    if let Some(evicted) = queues.enqueue(channel, packet) {
        debug!(
            %channel,
            type_id = evicted.type_id(),
            "queue full; dropped oldest packet"
        );
    }
}

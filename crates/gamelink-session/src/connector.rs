use std::net::SocketAddr;

use gamelink_frame::{PacketReader, PacketWriter};
use gamelink_transport::GameStream;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::Result;

/// A freshly opened connection, split into its read and write halves.
pub(crate) struct Connection {
    pub(crate) reader: PacketReader<GameStream>,
    pub(crate) writer: PacketWriter<GameStream>,
    pub(crate) local_addr: SocketAddr,
}

/// Connect to `address` and prepare both halves of the socket.
pub(crate) fn open(address: &str, config: &SessionConfig) -> Result<Connection> {
    let stream = gamelink_transport::connect(address, config.connect_timeout)?;
    stream.set_nodelay(config.nodelay)?;
    if config.keepalive {
        stream.set_keepalive(true)?;
    }

    let local_addr = stream.local_addr()?;
    let reader_stream = stream.try_clone()?;

    // The receive loop blocks until data arrives or the socket is shut down.
    let reader = PacketReader::with_read_timeout(
        reader_stream,
        config.framer(),
        config.read_chunk_size,
        None,
    )?;
    let writer = PacketWriter::with_write_timeout(stream, config.framer(), config.write_timeout)?;

    debug!(%address, %local_addr, "connection ready");
    Ok(Connection {
        reader,
        writer,
        local_addr,
    })
}

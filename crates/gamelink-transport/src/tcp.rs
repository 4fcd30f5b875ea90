use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::GameStream;

/// Default time allowed for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve `address` and connect to the first socket address that accepts.
///
/// `address` is anything [`ToSocketAddrs`] accepts as a string, e.g.
/// `"127.0.0.1:4000"` or `"game.example.net:4000"`. Each resolved address is
/// tried in order with `timeout`. If every attempt timed out the result is
/// [`TransportError::Timeout`]; otherwise the last connect error is returned.
pub fn connect(address: &str, timeout: Duration) -> Result<GameStream> {
    let candidates = resolve(address)?;

    let mut last_err = None;
    let mut all_timed_out = true;
    for addr in candidates {
        debug!(%addr, ?timeout, "attempting connection");
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                info!(%addr, "connected to game server");
                return Ok(GameStream::from_tcp(stream));
            }
            Err(err) => {
                debug!(%addr, error = %err, "connection attempt failed");
                if !is_timeout(&err) {
                    all_timed_out = false;
                }
                last_err = Some(err);
            }
        }
    }

    match last_err {
        Some(_) if all_timed_out => Err(TransportError::Timeout {
            address: address.to_string(),
            timeout,
        }),
        Some(source) => Err(TransportError::Connect {
            address: address.to_string(),
            source,
        }),
        None => Err(TransportError::Resolve {
            address: address.to_string(),
            source: std::io::Error::new(ErrorKind::NotFound, "address resolved to nothing"),
        }),
    }
}

fn resolve(address: &str) -> Result<Vec<SocketAddr>> {
    let addrs = address
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            address: address.to_string(),
            source,
        })?
        .collect::<Vec<_>>();

    if addrs.is_empty() {
        return Err(TransportError::Resolve {
            address: address.to_string(),
            source: std::io::Error::new(ErrorKind::NotFound, "address resolved to nothing"),
        });
    }

    Ok(addrs)
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

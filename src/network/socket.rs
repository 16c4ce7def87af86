//! TCP connection provider

use crate::error::ConnectError;
use crate::probe::ConnectionProvider;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

/// Opens plain TCP connections, giving up after `timeout`.
///
/// The stream is closed when the probe that owns it drops it.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    timeout: Duration,
}

impl TcpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ConnectionProvider for TcpConnector {
    type Address = SocketAddr;
    type Connection = TcpStream;

    async fn connect(&self, addr: &SocketAddr) -> Result<TcpStream, ConnectError> {
        let stream = match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ConnectError::from(e)),
            Err(_) => return Err(ConnectError::Timeout),
        };

        // Handshake messages are tiny; don't let Nagle hold them back
        if let Err(e) = stream.set_nodelay(true) {
            log::trace!("{}: could not set TCP_NODELAY: {}", addr, e);
        }

        Ok(stream)
    }
}

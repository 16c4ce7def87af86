//! ADB capability check
//!
//! A host speaks ADB if, after we send `CNXN`, it answers with a
//! well-formed `CNXN`, `AUTH` or `STLS` header. Devices with USB debugging
//! authorisation pending answer `AUTH`; that still counts as ADB.

use crate::error::ProtocolError;
use crate::probe::ProtocolSession;
use crate::protocol::message::{AdbMessage, MessageHeader, HEADER_LEN, HOST_IDENTITY};
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// One ADB handshake over an open stream
pub struct AdbSession<S> {
    stream: S,
    timeout: Duration,
    identity: String,
}

impl<S> AdbSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream,
            timeout,
            identity: HOST_IDENTITY.to_string(),
        }
    }

    /// Override the system identity sent in `CNXN`
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    async fn handshake(&mut self) -> Result<bool, ProtocolError> {
        let hello = AdbMessage::connect(&self.identity).encode();
        self.stream.write_all(&hello).await?;
        self.stream.flush().await?;

        let mut raw = [0u8; HEADER_LEN];
        match self.stream.read_exact(&mut raw).await {
            Ok(_) => {}
            // Peer hung up on us: it heard us and declined
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        let header = MessageHeader::decode(&raw)?;
        log::trace!("ADB peer answered {}", header.command);
        Ok(header.command.is_handshake_reply())
    }
}

#[async_trait]
impl<S> ProtocolSession for AdbSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn supports_protocol(&mut self) -> Result<bool, ProtocolError> {
        match tokio::time::timeout(self.timeout, self.handshake()).await {
            Ok(result) => result,
            Err(_) => Err(ProtocolError::Timeout),
        }
    }
}

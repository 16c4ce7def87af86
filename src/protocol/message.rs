//! ADB wire messages
//!
//! Every ADB message is a 24-byte header of six little-endian `u32`s
//! followed by `data_length` bytes of payload:
//!
//! ```text
//! command | arg0 | arg1 | data_length | data_check | magic
//! ```
//!
//! `magic` is `command ^ 0xFFFF_FFFF` and `data_check` is the byte sum of
//! the payload.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

/// Size of an encoded message header
pub const HEADER_LEN: usize = 24;

/// Protocol version announced in `CNXN`
pub const A_VERSION: u32 = 0x0100_0000;

/// Largest payload we advertise we can receive
pub const MAX_PAYLOAD: u32 = 4096;

/// Upper bound on a payload length we are willing to believe from a peer
pub const MAX_PAYLOAD_LIMIT: u32 = 1024 * 1024;

/// System identity sent by a host-side client
pub const HOST_IDENTITY: &str = "host::";

/// ADB message commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Auth,
    Open,
    Okay,
    Close,
    Write,
    StartTls,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Connect,
        Command::Auth,
        Command::Open,
        Command::Okay,
        Command::Close,
        Command::Write,
        Command::StartTls,
    ];

    /// The command word as it appears on the wire
    pub fn code(self) -> u32 {
        match self {
            Command::Connect => 0x4e58_4e43,  // CNXN
            Command::Auth => 0x4854_5541,     // AUTH
            Command::Open => 0x4e45_504f,     // OPEN
            Command::Okay => 0x5941_4b4f,     // OKAY
            Command::Close => 0x4553_4c43,    // CLSE
            Command::Write => 0x4554_5257,    // WRTE
            Command::StartTls => 0x534c_5453, // STLS
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.code() == code)
    }

    /// Whether a daemon may send this in answer to our `CNXN`
    pub fn is_handshake_reply(self) -> bool {
        matches!(self, Command::Connect | Command::Auth | Command::StartTls)
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Connect => "CNXN",
            Command::Auth => "AUTH",
            Command::Open => "OPEN",
            Command::Okay => "OKAY",
            Command::Close => "CLSE",
            Command::Write => "WRTE",
            Command::StartTls => "STLS",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte sum of a payload, as carried in `data_check`
pub fn checksum(payload: &[u8]) -> u32 {
    payload.iter().fold(0u32, |sum, &b| sum.wrapping_add(u32::from(b)))
}

/// Decoded message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub command: Command,
    pub arg0: u32,
    pub arg1: u32,
    pub data_length: u32,
    pub data_check: u32,
}

impl MessageHeader {
    /// Parse and validate a header received from a peer
    pub fn decode(raw: &[u8; HEADER_LEN]) -> Result<Self, ProtocolError> {
        let mut buf = &raw[..];
        let code = buf.get_u32_le();
        let arg0 = buf.get_u32_le();
        let arg1 = buf.get_u32_le();
        let data_length = buf.get_u32_le();
        let data_check = buf.get_u32_le();
        let magic = buf.get_u32_le();

        if magic != code ^ 0xffff_ffff {
            return Err(ProtocolError::Malformed(format!(
                "bad magic {:#010x} for command {:#010x}",
                magic, code
            )));
        }

        let command = Command::from_code(code)
            .ok_or_else(|| ProtocolError::Malformed(format!("unknown command {:#010x}", code)))?;

        if data_length > MAX_PAYLOAD_LIMIT {
            return Err(ProtocolError::Malformed(format!(
                "payload of {} bytes exceeds limit",
                data_length
            )));
        }

        Ok(Self {
            command,
            arg0,
            arg1,
            data_length,
            data_check,
        })
    }

    fn encode_into(&self, buf: &mut BytesMut) {
        let code = self.command.code();
        buf.put_u32_le(code);
        buf.put_u32_le(self.arg0);
        buf.put_u32_le(self.arg1);
        buf.put_u32_le(self.data_length);
        buf.put_u32_le(self.data_check);
        buf.put_u32_le(code ^ 0xffff_ffff);
    }
}

/// A complete ADB message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdbMessage {
    pub command: Command,
    pub arg0: u32,
    pub arg1: u32,
    pub payload: Bytes,
}

impl AdbMessage {
    pub fn new(command: Command, arg0: u32, arg1: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            arg0,
            arg1,
            payload: payload.into(),
        }
    }

    /// The `CNXN` message a host sends to open a session
    pub fn connect(system_identity: &str) -> Self {
        let mut payload = BytesMut::with_capacity(system_identity.len() + 1);
        payload.put_slice(system_identity.as_bytes());
        payload.put_u8(0);
        Self::new(Command::Connect, A_VERSION, MAX_PAYLOAD, payload.freeze())
    }

    pub fn header(&self) -> MessageHeader {
        MessageHeader {
            command: self.command,
            arg0: self.arg0,
            arg1: self.arg1,
            data_length: self.payload.len() as u32,
            data_check: checksum(&self.payload),
        }
    }

    /// Encode header and payload into one buffer
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.payload.len());
        self.header().encode_into(&mut buf);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(encoded: &[u8]) -> [u8; HEADER_LEN] {
        let mut raw = [0u8; HEADER_LEN];
        raw.copy_from_slice(&encoded[..HEADER_LEN]);
        raw
    }

    #[test]
    fn test_command_words_spell_ascii() {
        for cmd in Command::ALL {
            assert_eq!(&cmd.code().to_le_bytes(), cmd.name().as_bytes());
        }
    }

    #[test]
    fn test_connect_message_layout() {
        let encoded = AdbMessage::connect(HOST_IDENTITY).encode();

        assert_eq!(encoded.len(), HEADER_LEN + 7);
        assert_eq!(&encoded[0..4], b"CNXN");
        assert_eq!(&encoded[4..8], &A_VERSION.to_le_bytes());
        assert_eq!(&encoded[8..12], &MAX_PAYLOAD.to_le_bytes());
        assert_eq!(&encoded[12..16], &7u32.to_le_bytes());
        assert_eq!(&encoded[16..20], &checksum(b"host::\0").to_le_bytes());
        assert_eq!(&encoded[20..24], &(Command::Connect.code() ^ 0xffff_ffff).to_le_bytes());
        assert_eq!(&encoded[HEADER_LEN..], b"host::\0");
    }

    #[test]
    fn test_decode_reads_back_header() {
        let message = AdbMessage::new(Command::Auth, 1, 0, &b"token"[..]);
        let header = MessageHeader::decode(&header_bytes(&message.encode())).unwrap();

        assert_eq!(header, message.header());
        assert_eq!(header.command, Command::Auth);
        assert_eq!(header.data_length, 5);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut raw = header_bytes(&AdbMessage::connect(HOST_IDENTITY).encode());
        raw[20] ^= 0x01;

        assert!(matches!(
            MessageHeader::decode(&raw),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_command() {
        let mut raw = [0u8; HEADER_LEN];
        let code = u32::from_le_bytes(*b"HTTP");
        raw[0..4].copy_from_slice(&code.to_le_bytes());
        raw[20..24].copy_from_slice(&(code ^ 0xffff_ffff).to_le_bytes());

        assert!(matches!(
            MessageHeader::decode(&raw),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_payload() {
        let mut raw = header_bytes(&AdbMessage::new(Command::Write, 1, 2, Bytes::new()).encode());
        raw[12..16].copy_from_slice(&(MAX_PAYLOAD_LIMIT + 1).to_le_bytes());

        assert!(MessageHeader::decode(&raw).is_err());
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(b""), 0);
        assert_eq!(checksum(&[0xff, 0x01]), 0x100);
    }
}

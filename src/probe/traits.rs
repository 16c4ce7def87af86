// adbmap collaborator traits
// The mapper only ever talks to a host through these seams

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use crate::error::{ConnectError, ProtocolError};

/// Terminal state of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    /// The connection could not be established
    Unreachable,
    /// Connected, and the peer answered but does not speak the protocol
    Unsupported,
    /// Connected, but the capability check failed or panicked
    Errored,
    /// Connected, and the peer confirmed the protocol
    Supported,
}

impl ProbeOutcome {
    /// Collapse the outcome into the single bit reported by `ping`
    pub fn is_supported(self) -> bool {
        matches!(self, ProbeOutcome::Supported)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProbeOutcome::Unreachable => "unreachable",
            ProbeOutcome::Unsupported => "unsupported",
            ProbeOutcome::Errored => "errored",
            ProbeOutcome::Supported => "supported",
        };
        f.write_str(name)
    }
}

/// Opens connections to candidate hosts.
///
/// A connection is owned by exactly one probe and released when it is
/// dropped, so implementations must close the underlying resource in `Drop`
/// (sockets from `tokio::net` already do). Timeouts and any retry policy
/// belong to the implementation; the mapper never retries.
#[async_trait]
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Endpoint descriptor this provider knows how to reach
    type Address: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Open connection handed to a protocol session
    type Connection: Send + 'static;

    /// Connect to `addr`, reporting failure as a value
    async fn connect(&self, addr: &Self::Address) -> Result<Self::Connection, ConnectError>;
}

/// A protocol spoken over one open connection
#[async_trait]
pub trait ProtocolSession: Send {
    /// Answer whether the peer implements the protocol.
    ///
    /// `Ok(false)` means the peer answered and is not a match; `Err` means
    /// the check could not reach a verdict.
    async fn supports_protocol(&mut self) -> Result<bool, ProtocolError>;
}

/// Builds a [`ProtocolSession`] from an open connection.
///
/// Any `Fn(C) -> S` is a factory, so a constructor such as
/// `|stream| AdbSession::new(stream, timeout)` can be passed directly.
pub trait SessionFactory<C>: Send + Sync + 'static {
    type Session: ProtocolSession + 'static;

    fn make_session(&self, conn: C) -> Self::Session;
}

impl<C, S, F> SessionFactory<C> for F
where
    F: Fn(C) -> S + Send + Sync + 'static,
    S: ProtocolSession + 'static,
{
    type Session = S;

    fn make_session(&self, conn: C) -> S {
        self(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(bool);

    #[async_trait]
    impl ProtocolSession for Fixed {
        async fn supports_protocol(&mut self) -> Result<bool, ProtocolError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_only_supported_is_positive() {
        assert!(ProbeOutcome::Supported.is_supported());
        assert!(!ProbeOutcome::Unsupported.is_supported());
        assert!(!ProbeOutcome::Unreachable.is_supported());
        assert!(!ProbeOutcome::Errored.is_supported());
    }

    #[test]
    fn test_outcome_serializes_lowercase() {
        let json = serde_json::to_string(&ProbeOutcome::Unreachable).unwrap();
        assert_eq!(json, "\"unreachable\"");
        assert_eq!(ProbeOutcome::Supported.to_string(), "supported");
    }

    #[tokio::test]
    async fn test_closure_is_a_session_factory() {
        let factory = |answer: bool| Fixed(answer);
        let mut session = factory.make_session(true);
        assert!(session.supports_protocol().await.unwrap());
    }
}

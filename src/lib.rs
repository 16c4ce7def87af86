//! adbmap - find the hosts on a network that speak a protocol
//!
//! The [`NetworkMapper`] fans a capability check out across a set of
//! addresses and returns the ones that pass. Transport and protocol are
//! plugged in through [`ConnectionProvider`] and [`SessionFactory`]; the crate
//! ships a TCP connector and an ADB session.
//!
//! ```no_run
//! use std::time::Duration;
//! use adbmap::{protocol::adb_factory, NetworkMapper, TcpConnector};
//!
//! # async fn run() -> adbmap::Result<()> {
//! let mapper = NetworkMapper::new(
//!     TcpConnector::new(Duration::from_secs(1)),
//!     adb_factory::<tokio::net::TcpStream>(Duration::from_secs(2)),
//! );
//! let targets = (1..=254).map(|i| ([192, 168, 1, i], 5555).into());
//! for device in mapper.scan(targets).await? {
//!     println!("{}", device);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod probe;
pub mod protocol;
pub mod scanner;
pub mod utils;

// Re-export commonly used types
pub use config::ScanConfig;
pub use error::{ConnectError, ProtocolError, ScanError};
pub use network::TcpConnector;
pub use probe::{ConnectionProvider, ProbeOutcome, ProtocolSession, SessionFactory};
pub use protocol::AdbSession;
pub use scanner::{NetworkMapper, ScanReport, ScanStats};

pub type Result<T> = std::result::Result<T, ScanError>;

//! Network module: transport-level connection providers

pub mod socket;

pub use socket::TcpConnector;

//! Application protocols the mapper can check for

pub mod adb;
pub mod message;

pub use adb::AdbSession;
pub use message::{AdbMessage, Command, MessageHeader};

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Session factory building an [`AdbSession`] with the given handshake timeout
pub fn adb_factory<S>(timeout: Duration) -> impl Fn(S) -> AdbSession<S> + Send + Sync + 'static
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    move |stream| AdbSession::new(stream, timeout)
}

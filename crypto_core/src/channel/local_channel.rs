use std::io::Result;
use std::os::unix::net::UnixStream;

use super::{CloneableStream, StreamConnection};

impl CloneableStream for UnixStream {
    fn try_clone_stream(&self) -> Result<Self> {
        self.try_clone()
    }
}

/// In-process connection used by tests and benchmarks.
pub type LocalConnection = StreamConnection<UnixStream>;

/// A pair of connections wired to each other.
pub fn local_connection_pair() -> Result<(LocalConnection, LocalConnection)> {
    let (left, right) = UnixStream::pair()?;
    Ok((StreamConnection::new(left), StreamConnection::new(right)))
}

use std::io::Result;
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::str::FromStr;

use super::{CloneableStream, StreamConnection};

/// Which side of the TCP connection this party takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "server" | "0" => Ok(Role::Server),
            "client" | "1" => Ok(Role::Client),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl CloneableStream for TcpStream {
    fn try_clone_stream(&self) -> Result<Self> {
        self.try_clone()
    }
}

/// Connection between two parties over a TCP socket.
pub type TcpConnection = StreamConnection<TcpStream>;

impl TcpConnection {
    /// Bind `addr` and wait for the peer to connect.
    pub fn listen<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let (stream, _) = listener.accept()?;
        stream.set_nodelay(true)?;
        Ok(StreamConnection::new(stream))
    }

    /// Connect to a listening peer.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(StreamConnection::new(stream))
    }

    /// Dispatch to [`TcpConnection::listen`]/[`TcpConnection::connect`]
    /// according to `role`.
    pub fn from_role<A: ToSocketAddrs>(role: Role, addr: A) -> Result<Self> {
        match role {
            Role::Server => Self::listen(addr),
            Role::Client => Self::connect(addr),
        }
    }
}

//! Bidirectional byte channels connecting the two protocol parties.

pub mod local_channel;
pub mod net_channel;

pub use local_channel::{local_connection_pair, LocalConnection};
pub use net_channel::{Role, TcpConnection};

use std::io::{Error, ErrorKind, Read, Result, Write};
use std::thread::{self, JoinHandle};

const HEADER_SIZE: usize = 4;

/// A trait for a bidirectional channel to the other party.
///
/// One outstanding send and one outstanding receive may be in flight at the
/// same time; a connection never serves two concurrent transfers in the
/// same direction.
pub trait Connection {
    /// Write exactly `buffer.len()` bytes with no framing. The peer must
    /// know the length out-of-band.
    fn send(&mut self, buffer: &[u8]) -> Result<()>;

    /// Read exactly `buffer.len()` bytes with no framing.
    fn recv(&mut self, buffer: &mut [u8]) -> Result<()>;

    /// Flush any buffered writes.
    fn flush(&mut self) -> Result<()>;

    /// Write a message prefixed with its length as a 4-byte big-endian
    /// header. Fails if the length does not fit the header.
    fn send_message(&mut self, message: &[u8]) -> Result<()> {
        let length = u32::try_from(message.len())
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "message too long"))?;
        self.send(&length.to_be_bytes())?;
        self.send(message)?;
        self.flush()
    }

    /// Read a length-prefixed message.
    fn recv_message(&mut self) -> Result<Vec<u8>> {
        let mut header = [0u8; HEADER_SIZE];
        self.recv(&mut header)?;
        let length = u32::from_be_bytes(header) as usize;
        let mut message = vec![0u8; length];
        self.recv(&mut message)?;
        Ok(message)
    }

    /// Start sending `buffer`; the returned handle resolves once the bytes
    /// are on the wire. The default performs the blocking send before
    /// returning an already-resolved handle.
    fn async_send(&mut self, buffer: Vec<u8>) -> Result<Transfer<()>> {
        self.send(&buffer)?;
        self.flush()?;
        Ok(Transfer::ready(()))
    }

    /// Start receiving exactly `length` bytes; the returned handle resolves
    /// to the filled buffer. The default performs the blocking read before
    /// returning an already-resolved handle.
    fn async_recv(&mut self, length: usize) -> Result<Transfer<Vec<u8>>> {
        let mut buffer = vec![0u8; length];
        self.recv(&mut buffer)?;
        Ok(Transfer::ready(buffer))
    }
}

/// Handle for a transfer started by [`Connection::async_send`] or
/// [`Connection::async_recv`].
pub struct Transfer<T>(TransferState<T>);

enum TransferState<T> {
    Ready(T),
    Running(JoinHandle<Result<T>>),
}

impl<T> Transfer<T> {
    /// A transfer that has already completed.
    pub fn ready(value: T) -> Self {
        Transfer(TransferState::Ready(value))
    }

    /// A transfer completing on a background thread.
    pub fn running(handle: JoinHandle<Result<T>>) -> Self {
        Transfer(TransferState::Running(handle))
    }

    /// Block until the transfer completes.
    pub fn wait(self) -> Result<T> {
        match self.0 {
            TransferState::Ready(value) => Ok(value),
            TransferState::Running(handle) => handle
                .join()
                .map_err(|_| Error::new(ErrorKind::Other, "transfer thread panicked"))?,
        }
    }
}

/// Byte streams that can be duplicated into a second, independently usable
/// handle on the same underlying connection.
pub trait CloneableStream: Read + Write + Send + Sized + 'static {
    fn try_clone_stream(&self) -> Result<Self>;
}

/// Connection over any cloneable byte stream.
pub struct StreamConnection<S> {
    stream: S,
    read_bytes: usize,
    write_bytes: usize,
}

impl<S: CloneableStream> StreamConnection<S> {
    /// New connection over an established stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_bytes: 0,
            write_bytes: 0,
        }
    }

    /// Total number of bytes read so far.
    pub fn read_bytes(&self) -> usize {
        self.read_bytes
    }

    /// Total number of bytes written so far.
    pub fn write_bytes(&self) -> usize {
        self.write_bytes
    }
}

impl<S: CloneableStream> Connection for StreamConnection<S> {
    #[inline(always)]
    fn send(&mut self, buffer: &[u8]) -> Result<()> {
        self.stream.write_all(buffer)?;
        self.write_bytes += buffer.len();
        Ok(())
    }

    #[inline(always)]
    fn recv(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.stream.read_exact(buffer)?;
        self.read_bytes += buffer.len();
        Ok(())
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<()> {
        self.stream.flush()
    }

    fn async_send(&mut self, buffer: Vec<u8>) -> Result<Transfer<()>> {
        let mut stream = self.stream.try_clone_stream()?;
        self.write_bytes += buffer.len();
        Ok(Transfer::running(thread::spawn(move || {
            stream.write_all(&buffer)?;
            stream.flush()
        })))
    }

    fn async_recv(&mut self, length: usize) -> Result<Transfer<Vec<u8>>> {
        let mut stream = self.stream.try_clone_stream()?;
        self.read_bytes += length;
        Ok(Transfer::running(thread::spawn(move || {
            let mut buffer = vec![0u8; length];
            stream.read_exact(&mut buffer)?;
            Ok(buffer)
        })))
    }
}

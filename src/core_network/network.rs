//! Socket capability consumed by the session engine.
//!
//! The engine never touches `std::net` directly: it asks a [`SocketPool`] for
//! listeners and outbound connections and drives them through the
//! non-blocking [`Listener`] and [`Connection`] traits. [`StdSocketPool`] is
//! the implementation used by the binary.

use log::trace;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::time::Duration;

/// Factory for the sockets a session needs.
pub trait SocketPool {
    type Listener: Listener<Stream = Self::Stream>;
    type Stream: Connection;

    /// Binds a non-blocking listening socket.
    fn listen(&self, addr: SocketAddrV4) -> io::Result<Self::Listener>;

    /// Connects out and returns a non-blocking stream.
    fn connect(&self, addr: SocketAddrV4, timeout: Duration) -> io::Result<Self::Stream>;
}

pub trait Listener {
    type Stream;

    /// Returns `WouldBlock` when nobody is waiting.
    fn accept(&mut self) -> io::Result<(Self::Stream, SocketAddrV4)>;

    fn local_addr(&self) -> io::Result<SocketAddrV4>;
}

pub trait Connection {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// `Ok(0)` means the peer closed its side.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Zero-length liveness check. Fails only when the peer is gone.
    fn probe(&mut self) -> io::Result<()>;

    fn local_addr(&self) -> io::Result<SocketAddrV4>;
}

/// Conditions that are retried silently on a non-blocking socket.
pub fn is_transient(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted)
}

/// Sends the whole buffer, retrying partial sends and `WouldBlock` until the
/// data is flushed or the channel breaks.
pub fn send_all<S: Connection + ?Sized>(stream: &mut S, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        match stream.send(data) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "peer stopped accepting data",
                ))
            }
            Ok(n) => data = &data[n..],
            Err(e) if is_transient(&e) => std::hint::spin_loop(),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn ipv4_only(addr: SocketAddr) -> io::Result<SocketAddrV4> {
    match addr {
        SocketAddr::V4(addr) => Ok(addr),
        SocketAddr::V6(addr) => Err(io::Error::new(
            ErrorKind::Unsupported,
            format!("IPv6 endpoint {} is not supported", addr),
        )),
    }
}

/// [`SocketPool`] over `std::net` TCP sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdSocketPool;

impl SocketPool for StdSocketPool {
    type Listener = TcpListener;
    type Stream = TcpStream;

    fn listen(&self, addr: SocketAddrV4) -> io::Result<TcpListener> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        trace!("Listening on {}", listener.local_addr()?);
        Ok(listener)
    }

    fn connect(&self, addr: SocketAddrV4, timeout: Duration) -> io::Result<TcpStream> {
        let stream = TcpStream::connect_timeout(&SocketAddr::V4(addr), timeout)?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        trace!("Connected out to {}", addr);
        Ok(stream)
    }
}

impl Listener for TcpListener {
    type Stream = TcpStream;

    fn accept(&mut self) -> io::Result<(TcpStream, SocketAddrV4)> {
        let (stream, peer) = TcpListener::accept(self)?;
        stream.set_nonblocking(true)?;
        Ok((stream, ipv4_only(peer)?))
    }

    fn local_addr(&self) -> io::Result<SocketAddrV4> {
        ipv4_only(TcpListener::local_addr(self)?)
    }
}

impl Connection for TcpStream {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }

    fn probe(&mut self) -> io::Result<()> {
        let mut byte = [0u8; 1];
        match self.peek(&mut byte) {
            Ok(0) => Err(io::Error::new(
                ErrorKind::ConnectionAborted,
                "peer closed the connection",
            )),
            Ok(_) => Ok(()),
            Err(e) if is_transient(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddrV4> {
        ipv4_only(TcpStream::local_addr(self)?)
    }
}

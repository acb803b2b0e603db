//! Public server handle and the async host loop used by the binary.

use crate::clock::{Clock, SystemClock};
use crate::core_error::{ConfigError, SetupError};
use crate::core_fs::{Filesystem, LocalFilesystem};
use crate::core_network::{SocketPool, StdSocketPool};
use crate::core_transfer::TransferMode;
use crate::session::{Session, SessionConfig};
use anyhow::Result;
use log::info;
use std::io::{self, ErrorKind};
use std::net::SocketAddrV4;
use std::time::Duration;
use tokio::signal;
use tokio::time::{self, MissedTickBehavior};

/// An FTP server serving one client at a time.
///
/// After [`FtpServer::close`] (or drop) the server is sealed: every method
/// becomes a no-op returning a neutral value.
pub struct FtpServer<P = StdSocketPool, F = LocalFilesystem, C = SystemClock>
where
    P: SocketPool,
    F: Filesystem,
    C: Clock,
{
    inner: Option<Session<P, F, C>>,
}

impl FtpServer {
    /// Binds a server on real sockets, serving `fs`.
    pub fn bind(config: SessionConfig, fs: LocalFilesystem) -> Result<Self, SetupError> {
        Self::with_parts(StdSocketPool, fs, SystemClock::new(), config)
    }
}

impl<P: SocketPool, F: Filesystem, C: Clock> FtpServer<P, F, C> {
    pub fn with_parts(pool: P, fs: F, clock: C, config: SessionConfig) -> Result<Self, SetupError> {
        Ok(Self {
            inner: Some(Session::new(pool, fs, clock, config)?),
        })
    }

    /// Runs one step. Returns `true` when a client quit or was lost.
    pub fn poll(&mut self) -> bool {
        self.inner.as_mut().map_or(false, Session::poll)
    }

    /// Polls until the server is closed.
    pub fn serve(&mut self) {
        while self.inner.is_some() {
            self.poll();
            std::thread::yield_now();
        }
    }

    /// Polls until the first client disconnects.
    pub fn serve_till_quit(&mut self) {
        while self.inner.is_some() {
            if self.poll() {
                break;
            }
            std::thread::yield_now();
        }
    }

    /// Drops the client and the listener. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut session) = self.inner.take() {
            session.disconnect();
            info!("FTP server closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    pub fn local_addr(&self) -> io::Result<SocketAddrV4> {
        match &self.inner {
            Some(session) => session.local_addr(),
            None => Err(io::Error::new(ErrorKind::NotConnected, "server is closed")),
        }
    }

    /// Drops the current client, if any.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.inner.as_mut() {
            session.disconnect();
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.inner.as_ref().and_then(Session::user)
    }

    pub fn is_passive(&self) -> bool {
        self.inner.as_ref().map_or(false, Session::is_passive)
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.as_ref().map_or(false, Session::is_authenticated)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.as_ref().map_or(false, Session::is_connected)
    }

    pub fn client(&self) -> Option<SocketAddrV4> {
        self.inner.as_ref().and_then(Session::client)
    }

    pub fn transfer_mode(&self) -> TransferMode {
        self.inner
            .as_ref()
            .map_or(TransferMode::Binary, Session::transfer_mode)
    }

    pub fn max_cache(&self) -> usize {
        self.inner.as_ref().map_or(0, Session::max_cache)
    }

    pub fn set_max_cache(&mut self, slots: usize) -> Result<(), ConfigError> {
        match self.inner.as_mut() {
            Some(session) => session.set_max_cache(slots),
            None => Ok(()),
        }
    }

    pub fn transfer_chunk(&self) -> usize {
        self.inner.as_ref().map_or(0, Session::transfer_chunk)
    }

    pub fn set_transfer_chunk(&mut self, chunk: usize) -> Result<(), ConfigError> {
        match self.inner.as_mut() {
            Some(session) => session.set_transfer_chunk(chunk),
            None => Ok(()),
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.as_ref().map_or(false, Session::is_read_only)
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        if let Some(session) = self.inner.as_mut() {
            session.set_read_only(read_only);
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        if let Some(session) = self.inner.as_mut() {
            session.set_verbose(verbose);
        }
    }

    pub fn set_pasv_port(&mut self, port: u16) {
        if let Some(session) = self.inner.as_mut() {
            session.set_pasv_port(port);
        }
    }

    pub fn filesystem(&self) -> Option<&F> {
        self.inner.as_ref().map(Session::filesystem)
    }
}

impl<P: SocketPool, F: Filesystem, C: Clock> Drop for FtpServer<P, F, C> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drives `server` from a tokio runtime until Ctrl-C, or until the first
/// client leaves when `once` is set.
///
/// Each tick runs one `poll()`. A transfer keeps the tick busy until it ends;
/// missed ticks are skipped rather than replayed.
pub async fn run(mut server: FtpServer, poll_interval: Duration, once: bool) -> Result<()> {
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                if server.poll() && once {
                    info!("Client left, stopping");
                    break;
                }
            }
        }
    }

    server.close();
    Ok(())
}

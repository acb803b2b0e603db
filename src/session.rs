//! The session engine.
//!
//! A [`Session`] owns the control listener, at most one client and every
//! piece of per-client state. The host drives it by calling
//! [`Session::poll`]; each call does one bounded unit of work and never waits
//! for the client to send anything.

use crate::clock::Clock;
use crate::constants::{
    DEFAULT_AUTH_TIMEOUT, DEFAULT_LISTEN_PORT, DEFAULT_MAX_BUFFER, DEFAULT_MAX_CACHE,
    DEFAULT_PASV_PORT, DEFAULT_TRANSFER_CHUNK, KEEPALIVE_INTERVAL, MIN_CACHE_SLOTS,
};
use crate::core_auth::{AuthState, CredentialTable};
use crate::core_error::{ConfigError, FtpError, SetupError};
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::ftpcommand::LineBuffer;
use crate::core_ftpcommand::responses::{format_line, Reply};
use crate::core_network::network::{is_transient, send_all, Connection, Listener, SocketPool};
use crate::core_network::{DataChannelManager, PassiveEndpoint};
use crate::core_transfer::{RxBuffer, TextCodec, TransferMode, WriteCache};
use log::{debug, error, info, log, warn, Level};
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

/// Everything a session needs to know at construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Control listener address.
    pub bind: SocketAddrV4,
    pub pasv_port: u16,
    /// Address advertised in `227` replies. Defaults to the local address of
    /// the control connection.
    pub pasv_address: Option<Ipv4Addr>,
    /// Write cache size, in receive buffers.
    pub max_cache: usize,
    /// Receive buffer size.
    pub max_buffer: usize,
    pub transfer_chunk: usize,
    pub auth_timeout_secs: f64,
    pub verbose: bool,
    pub read_only: bool,
    pub local_time: bool,
    pub credentials: CredentialTable,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_LISTEN_PORT),
            pasv_port: DEFAULT_PASV_PORT,
            pasv_address: None,
            max_cache: DEFAULT_MAX_CACHE,
            max_buffer: DEFAULT_MAX_BUFFER,
            transfer_chunk: DEFAULT_TRANSFER_CHUNK,
            auth_timeout_secs: DEFAULT_AUTH_TIMEOUT.as_secs_f64(),
            verbose: false,
            read_only: false,
            local_time: false,
            credentials: CredentialTable::new(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<Duration, ConfigError> {
        if self.max_buffer == 0 {
            return Err(ConfigError::ZeroSize("max_buffer"));
        }
        if self.transfer_chunk == 0 {
            return Err(ConfigError::ZeroSize("transfer_chunk"));
        }
        if self.max_cache < MIN_CACHE_SLOTS {
            return Err(ConfigError::CacheTooSmall {
                min: MIN_CACHE_SLOTS,
                got: self.max_cache,
            });
        }
        auth_timeout(self.auth_timeout_secs)
    }
}

fn auth_timeout(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::InvalidAuthTimeout(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidAuthTimeout(secs))
}

pub struct Session<P: SocketPool, F: Filesystem, C: Clock> {
    pub(crate) pool: P,
    pub(crate) fs: F,
    pub(crate) clock: C,
    listener: P::Listener,
    bind: SocketAddrV4,

    pub(crate) control: Option<P::Stream>,
    client_address: Option<SocketAddrV4>,
    control_broken: bool,
    pub(crate) client_quit: bool,
    keepalive_deadline: Duration,

    pub(crate) credentials: CredentialTable,
    pub(crate) auth_state: AuthState,
    pub(crate) auth_deadline: Option<Duration>,
    pub(crate) auth_timeout: Duration,

    pub(crate) mode: TransferMode,
    pub(crate) read_only: bool,
    pub(crate) verbose: bool,
    pub(crate) local_time: bool,
    pub(crate) rename_source: Option<String>,

    pub(crate) rx: RxBuffer,
    lines: LineBuffer,
    pub(crate) cache: WriteCache,
    cache_slots: usize,
    pub(crate) tx: Box<[u8]>,
    pub(crate) codec: TextCodec,

    pub(crate) data: DataChannelManager<P>,
    pasv_port: u16,
    pasv_address: Option<Ipv4Addr>,
}

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// Validates `config` and binds the control listener.
    pub fn new(pool: P, mut fs: F, clock: C, config: SessionConfig) -> Result<Self, SetupError> {
        let auth_timeout = config.validate()?;
        let listener = pool.listen(config.bind).map_err(|source| SetupError::Bind {
            addr: config.bind,
            source,
        })?;

        if let Err(e) = fs.set_writable(false) {
            warn!("Could not write-protect storage: {}", e);
        }
        fs.reset_dir();

        match listener.local_addr() {
            Ok(addr) => info!("Listening for FTP clients on {}", addr),
            Err(e) => warn!("Listening, but the local address is unknown: {}", e),
        }

        Ok(Self {
            pool,
            fs,
            clock,
            listener,
            bind: config.bind,
            control: None,
            client_address: None,
            control_broken: false,
            client_quit: false,
            keepalive_deadline: Duration::ZERO,
            auth_state: config.credentials.initial_state(),
            credentials: config.credentials,
            auth_deadline: None,
            auth_timeout,
            mode: TransferMode::Binary,
            read_only: config.read_only,
            verbose: config.verbose,
            local_time: config.local_time,
            rename_source: None,
            rx: RxBuffer::new(config.max_buffer),
            lines: LineBuffer::new(config.max_buffer),
            cache: WriteCache::new(config.max_cache * config.max_buffer),
            cache_slots: config.max_cache,
            tx: vec![0u8; config.transfer_chunk].into_boxed_slice(),
            codec: TextCodec::new(config.transfer_chunk.max(config.max_buffer)),
            data: DataChannelManager::new(),
            pasv_port: config.pasv_port,
            pasv_address: config.pasv_address,
        })
    }

    /// One step of the server. Returns `true` when a client quit or its
    /// connection was lost during this call. Clients dropped for not logging
    /// in on time are not reported.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now();

        if self.control.is_some() && now >= self.keepalive_deadline {
            self.keepalive_deadline = now + KEEPALIVE_INTERVAL;
            let alive = self.control.as_mut().map_or(true, |c| c.probe().is_ok());
            if !alive {
                info!("Lost connection to {}", self.client_label());
                self.disconnect();
                return true;
            }
        }

        match self.listener.accept() {
            Ok((stream, peer)) => {
                if self.control.is_some() {
                    self.reject(stream, peer);
                } else {
                    self.connect(stream, peer);
                }
            }
            Err(e) if is_transient(&e) => {}
            Err(e) => error!("Failed to accept a control connection: {}", e),
        }

        if self.control.is_none() {
            return false;
        }

        if let Some(deadline) = self.auth_deadline {
            if !self.auth_state.is_authenticated() && now >= deadline {
                info!(
                    "Kicked {}: not logged in within {:?}",
                    self.client_label(),
                    self.auth_timeout
                );
                self.disconnect();
                return false;
            }
        }

        let received = match self.control.as_mut() {
            Some(control) => control.recv(self.rx.as_mut_slice()),
            None => return false,
        };
        let size = match received {
            Ok(0) => {
                info!("Client {} closed the control connection", self.client_label());
                self.disconnect();
                return true;
            }
            Ok(size) => size,
            Err(e) if is_transient(&e) => return false,
            Err(e) => {
                warn!("Control connection to {} failed: {}", self.client_label(), e);
                self.disconnect();
                return true;
            }
        };

        let lines = match std::str::from_utf8(self.rx.filled(size)) {
            Ok(raw) => self.lines.push(raw),
            Err(_) => {
                debug!("Dropped {} bytes of non UTF-8 input", size);
                return false;
            }
        };

        for line in &lines {
            self.dispatch(line);
            if self.control.is_none() || self.control_broken {
                break;
            }
        }

        if self.control_broken {
            warn!("Control connection to {} broke", self.client_label());
            self.disconnect();
            return true;
        }
        std::mem::take(&mut self.client_quit)
    }

    fn connect(&mut self, stream: P::Stream, peer: SocketAddrV4) {
        info!("Connected client from {}", peer);
        let now = self.clock.now();
        self.control = Some(stream);
        self.client_address = Some(peer);
        self.control_broken = false;
        self.keepalive_deadline = now + KEEPALIVE_INTERVAL;
        self.rx.zero();
        self.lines.clear();
        self.auth_state = self.credentials.initial_state();
        self.auth_deadline = if self.auth_state.is_authenticated() {
            None
        } else {
            Some(now + self.auth_timeout)
        };
        self.reply(Reply::Welcome);
    }

    fn reject(&mut self, mut stream: P::Stream, peer: SocketAddrV4) {
        warn!("Kicked {}: a client is already connected", peer);
        let line = format_line(Reply::ServiceNotAvailable.text());
        if let Err(e) = send_all(&mut stream, line.as_bytes()) {
            debug!("Could not tell {} to go away: {}", peer, e);
        }
    }

    /// Drops the client and resets all per-client state.
    pub fn disconnect(&mut self) {
        if self.control.take().is_some() {
            info!("Disconnected {}", self.client_label());
        }
        self.client_address = None;
        self.control_broken = false;
        self.data.reset();
        self.rx.zero();
        self.lines.clear();
        self.cache.clear();
        self.codec.reset();
        self.auth_state = AuthState::Unauthenticated;
        self.auth_deadline = None;
        self.rename_source = None;
        self.mode = TransferMode::Binary;
        self.fs.reset_dir();
    }

    fn client_label(&self) -> String {
        match self.client_address {
            Some(addr) => addr.to_string(),
            None => String::from("<none>"),
        }
    }

    /// Level for command and reply traffic.
    pub(crate) fn traffic_level(&self) -> Level {
        if self.verbose {
            Level::Info
        } else {
            Level::Debug
        }
    }

    pub(crate) fn reply(&mut self, reply: Reply) {
        self.send_line(reply.text());
    }

    /// Sends one status line. A failed write marks the control connection
    /// broken; `poll` drops the client afterwards.
    pub(crate) fn send_line(&mut self, text: &str) {
        log!(self.traffic_level(), "< {}", text);
        if let Some(control) = self.control.as_mut() {
            if let Err(e) = send_all(control, format_line(text).as_bytes()) {
                error!("Failed to send reply: {}", e);
                self.control_broken = true;
            }
        }
    }

    fn passive_endpoint(&self) -> PassiveEndpoint {
        let advertise = self
            .pasv_address
            .or_else(|| {
                self.control
                    .as_ref()
                    .and_then(|c| c.local_addr().ok())
                    .map(|addr| *addr.ip())
            })
            .unwrap_or(*self.bind.ip());
        PassiveEndpoint {
            bind: SocketAddrV4::new(*self.bind.ip(), self.pasv_port),
            advertise,
        }
    }

    /// Opens the data channel for a transfer, a no-op when it is open.
    ///
    /// In passive mode the `227` reply is sent on the control connection
    /// between binding the listener and waiting for the client.
    pub(crate) fn enable_data(&mut self) -> Result<(), FtpError> {
        if self.control.is_none() {
            return Err(FtpError::DataChannel(io::Error::new(
                ErrorKind::NotConnected,
                "no client",
            )));
        }
        if self.data.is_open() {
            return Ok(());
        }
        if !self.data.is_passive() {
            return self.data.connect_active(&self.pool);
        }

        let endpoint = self.passive_endpoint();
        let reply = self.data.listen_passive(&self.pool, endpoint)?;
        self.send_line(&reply);
        if self.control_broken {
            self.data.disable();
            return Err(FtpError::TransferAborted(io::Error::new(
                ErrorKind::BrokenPipe,
                "control connection broke before the passive reply",
            )));
        }
        self.data.accept_passive(&self.clock)
    }

    /// Runs `op` with the storage unlocked for writing and write-protects it
    /// again afterwards, whatever `op` returned.
    pub(crate) fn with_write_access<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, FtpError>,
    ) -> Result<T, FtpError> {
        if self.read_only {
            return Err(FtpError::ReadOnly);
        }
        self.fs.set_writable(true).map_err(FtpError::StorageLocked)?;
        let result = op(self);
        if let Err(e) = self.fs.set_writable(false) {
            warn!("Failed to write-protect storage again: {}", e);
        }
        result
    }

    pub fn local_addr(&self) -> io::Result<SocketAddrV4> {
        self.listener.local_addr()
    }

    pub fn user(&self) -> Option<&str> {
        self.auth_state.username()
    }

    pub fn is_passive(&self) -> bool {
        self.data.is_passive()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_state.is_authenticated()
    }

    pub fn is_connected(&self) -> bool {
        self.control.is_some()
    }

    pub fn client(&self) -> Option<SocketAddrV4> {
        self.client_address
    }

    pub fn transfer_mode(&self) -> TransferMode {
        self.mode
    }

    pub fn max_cache(&self) -> usize {
        self.cache_slots
    }

    /// Resizes the write cache. The new cache is allocated before the old
    /// one is released.
    pub fn set_max_cache(&mut self, slots: usize) -> Result<(), ConfigError> {
        if slots < MIN_CACHE_SLOTS {
            return Err(ConfigError::CacheTooSmall {
                min: MIN_CACHE_SLOTS,
                got: slots,
            });
        }
        let cache = WriteCache::new(slots * self.rx.capacity());
        self.cache = cache;
        self.cache_slots = slots;
        debug!("Write cache resized to {} slots", slots);
        Ok(())
    }

    pub fn transfer_chunk(&self) -> usize {
        self.tx.len()
    }

    pub fn set_transfer_chunk(&mut self, chunk: usize) -> Result<(), ConfigError> {
        if chunk == 0 {
            return Err(ConfigError::ZeroSize("transfer_chunk"));
        }
        let tx = vec![0u8; chunk].into_boxed_slice();
        let codec = TextCodec::new(chunk.max(self.rx.capacity()));
        self.tx = tx;
        self.codec = codec;
        Ok(())
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn set_pasv_port(&mut self, port: u16) {
        self.pasv_port = port;
    }

    pub fn filesystem(&self) -> &F {
        &self.fs
    }
}

//! Lifecycle of the secondary socket used for listings and file transfers.
//!
//! The last PASV or PORT command picks the discipline. In active mode the
//! manager keeps the PORT target and connects out when a transfer needs the
//! channel; in passive mode it listens on the fixed passive port, hands the
//! `227` line back to the session and then waits a bounded time for the
//! client to connect. Transfers open the channel before moving bytes and call
//! [`DataChannelManager::disable`] afterwards on every path.

use crate::clock::Clock;
use crate::constants::{ACTIVE_CONNECT_TIMEOUT, PASV_ACCEPT_TIMEOUT};
use crate::core_error::FtpError;
use crate::core_network::network::SocketPool;
use crate::core_network::pasv::{accept_pasv_connection, setup_pasv_listener};
use log::{debug, info, warn};
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Current state of the data socket.
pub enum DataChannel<L, S> {
    Closed,
    /// PORT received; we connect to this endpoint on demand.
    ActivePending(SocketAddrV4),
    PassiveListening(L),
    Open(S),
}

impl<L, S> DataChannel<L, S> {
    pub fn name(&self) -> &'static str {
        match self {
            DataChannel::Closed => "closed",
            DataChannel::ActivePending(_) => "active-pending",
            DataChannel::PassiveListening(_) => "passive-listening",
            DataChannel::Open(_) => "open",
        }
    }
}

/// Where a passive listener binds and what it advertises.
#[derive(Debug, Clone, Copy)]
pub struct PassiveEndpoint {
    pub bind: SocketAddrV4,
    pub advertise: Ipv4Addr,
}

pub struct DataChannelManager<P: SocketPool> {
    state: DataChannel<P::Listener, P::Stream>,
    passive: bool,
    active_target: Option<SocketAddrV4>,
}

impl<P: SocketPool> Default for DataChannelManager<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SocketPool> DataChannelManager<P> {
    pub fn new() -> Self {
        Self {
            state: DataChannel::Closed,
            passive: false,
            active_target: None,
        }
    }

    pub fn is_passive(&self) -> bool {
        self.passive
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DataChannel::Open(_))
    }

    pub fn state(&self) -> &DataChannel<P::Listener, P::Stream> {
        &self.state
    }

    pub fn active_target(&self) -> Option<SocketAddrV4> {
        self.active_target
    }

    /// PASV: switch to the passive discipline and drop whatever was open.
    pub fn enter_passive(&mut self) {
        self.passive = true;
        self.active_target = None;
        self.state = DataChannel::Closed;
    }

    /// PORT: switch to the active discipline targeting `target`.
    pub fn enter_active(&mut self, target: SocketAddrV4) {
        self.passive = false;
        self.active_target = Some(target);
        self.state = DataChannel::ActivePending(target);
    }

    /// Active mode: connects out to the PORT target unless the channel is
    /// already open.
    pub fn connect_active(&mut self, pool: &P) -> Result<(), FtpError> {
        if self.is_open() {
            return Ok(());
        }
        let target = self.active_target.ok_or_else(|| {
            FtpError::DataChannel(io::Error::new(
                ErrorKind::NotConnected,
                "no PORT target given",
            ))
        })?;
        debug!("Enabling data channel ({})", self.state.name());
        let stream = pool
            .connect(target, ACTIVE_CONNECT_TIMEOUT)
            .map_err(FtpError::DataChannel)?;
        info!("Active data connection to {}", target);
        self.state = DataChannel::Open(stream);
        Ok(())
    }

    /// Passive mode, first half: binds the passive listener and returns the
    /// `227` line the caller must send before [`Self::accept_passive`].
    pub fn listen_passive(
        &mut self,
        pool: &P,
        endpoint: PassiveEndpoint,
    ) -> Result<String, FtpError> {
        debug!("Enabling data channel ({})", self.state.name());
        let (listener, reply) = setup_pasv_listener(pool, endpoint.bind, endpoint.advertise)?;
        self.state = DataChannel::PassiveListening(listener);
        Ok(reply)
    }

    /// Passive mode, second half: waits up to [`PASV_ACCEPT_TIMEOUT`] for the
    /// client. On timeout the channel is torn down and
    /// [`FtpError::PassiveTimeout`] is returned; the caller reports it and the
    /// session carries on.
    pub fn accept_passive<C: Clock>(&mut self, clock: &C) -> Result<(), FtpError> {
        let accepted = match &mut self.state {
            DataChannel::PassiveListening(listener) => {
                accept_pasv_connection(listener, clock, PASV_ACCEPT_TIMEOUT)
            }
            DataChannel::Open(_) => return Ok(()),
            _ => {
                return Err(FtpError::DataChannel(io::Error::new(
                    ErrorKind::NotConnected,
                    "passive listener is not set up",
                )))
            }
        };
        match accepted {
            Ok((stream, peer)) => {
                info!("Enabled PASV data connection from {}", peer);
                // One data connection per PASV; the listener goes away here.
                self.state = DataChannel::Open(stream);
                Ok(())
            }
            Err(e) => {
                warn!("PASV timed out, client did not connect");
                self.disable();
                Err(e)
            }
        }
    }

    /// The open data stream, if any.
    pub fn stream_mut(&mut self) -> Option<&mut P::Stream> {
        match &mut self.state {
            DataChannel::Open(stream) => Some(stream),
            _ => None,
        }
    }

    /// Releases the data socket. In active mode the PORT target is re-armed
    /// so the next transfer gets a fresh connection to the same endpoint.
    pub fn disable(&mut self) {
        debug!("Disabling data channel ({})", self.state.name());
        self.state = match (self.passive, self.active_target) {
            (false, Some(target)) => DataChannel::ActivePending(target),
            _ => DataChannel::Closed,
        };
    }

    /// Forgets everything, used when the control connection goes away.
    pub fn reset(&mut self) {
        self.state = DataChannel::Closed;
        self.passive = false;
        self.active_target = None;
    }
}

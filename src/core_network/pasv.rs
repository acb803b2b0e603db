use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::responses::pasv_reply;
use crate::core_network::network::{is_transient, Listener, SocketPool};
use crate::session::Session;
use log::{debug, error, info, trace};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{Duration, Instant};

/// Sets up a passive mode (PASV) listener.
/// Returns the listener and the formatted `227` reply advertising `advertise`
/// together with the port the listener actually got.
pub fn setup_pasv_listener<P: SocketPool>(
    pool: &P,
    bind: SocketAddrV4,
    advertise: Ipv4Addr,
) -> Result<(P::Listener, String), FtpError> {
    let listener = pool.listen(bind).map_err(FtpError::DataChannel)?;
    let port = listener
        .local_addr()
        .map_err(FtpError::DataChannel)?
        .port();

    let pasv_response = pasv_reply(advertise.octets(), port);
    debug!(
        "PASV listener set up on {}, advertising {}:{}",
        bind, advertise, port
    );
    Ok((listener, pasv_response))
}

/// Accepts the incoming data connection on the passive listener, busy-polling
/// until `timeout` has elapsed on `clock` or on the wall clock, whichever
/// comes first. A clock that never advances still times out.
pub fn accept_pasv_connection<L: Listener, C: Clock>(
    listener: &mut L,
    clock: &C,
    timeout: Duration,
) -> Result<(L::Stream, SocketAddrV4), FtpError> {
    let started = clock.now();
    let wall_deadline = Instant::now() + timeout;
    while clock.now().saturating_sub(started) < timeout && Instant::now() < wall_deadline {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!("Accepted data connection from: {}", peer);
                return Ok((stream, peer));
            }
            Err(e) if is_transient(&e) => std::hint::spin_loop(),
            Err(e) => {
                // Anything else is retried too; the deadline bounds the loop.
                trace!("PASV accept failed: {}", e);
            }
        }
    }

    error!("PASV timed out after {:?}", timeout);
    Err(FtpError::PassiveTimeout)
}

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// PASV: switches to passive mode and opens the data channel right away.
    /// The `227` reply goes out as soon as the passive listener is bound.
    pub(crate) fn handle_pasv(&mut self) -> Result<(), FtpError> {
        self.data.enter_passive();
        self.enable_data()?;
        info!("Passive data connection established");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};
    use crate::core_network::network::StdSocketPool;
    use std::net::TcpStream;

    #[test]
    fn test_pasv_listener_advertises_real_port() {
        let bind = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0);
        let (listener, reply) =
            setup_pasv_listener(&StdSocketPool, bind, Ipv4Addr::new(10, 1, 2, 3)).unwrap();
        let port = Listener::local_addr(&listener).unwrap().port();

        let expected = format!(
            "227 Entering Passive Mode (10,1,2,3,{},{}).",
            port / 256,
            port % 256
        );
        assert_eq!(reply, expected);
    }

    #[test]
    fn test_accept_pasv_connection_times_out() {
        let bind = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0);
        let (mut listener, _) =
            setup_pasv_listener(&StdSocketPool, bind, Ipv4Addr::LOCALHOST).unwrap();
        let clock = SystemClock::new();

        let result = accept_pasv_connection(&mut listener, &clock, Duration::from_millis(50));
        assert!(matches!(result, Err(FtpError::PassiveTimeout)));
        assert!(clock.now() >= Duration::from_millis(50));
    }

    #[test]
    fn test_accept_pasv_connection_times_out_on_frozen_clock() {
        let bind = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0);
        let (mut listener, _) =
            setup_pasv_listener(&StdSocketPool, bind, Ipv4Addr::LOCALHOST).unwrap();
        let clock = ManualClock::new();

        let started = Instant::now();
        let result = accept_pasv_connection(&mut listener, &clock, Duration::from_millis(50));
        assert!(matches!(result, Err(FtpError::PassiveTimeout)));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_accept_pasv_connection_succeeds() {
        let bind = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0);
        let (mut listener, _) =
            setup_pasv_listener(&StdSocketPool, bind, Ipv4Addr::LOCALHOST).unwrap();
        let addr = Listener::local_addr(&listener).unwrap();
        let _client = TcpStream::connect(addr).unwrap();

        let clock = SystemClock::new();
        let (_, peer) =
            accept_pasv_connection(&mut listener, &clock, Duration::from_secs(2)).unwrap();
        assert_eq!(*peer.ip(), Ipv4Addr::LOCALHOST);
    }
}

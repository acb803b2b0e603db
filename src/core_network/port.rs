use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::network::SocketPool;
use crate::session::Session;
use log::{debug, info};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Parses the `a,b,c,d,p1,p2` argument of the PORT (Active Mode) command.
///
/// The first four fields are the client's IPv4 octets, the last two the data
/// port split into high and low bytes (`port = 256 * p1 + p2`).
pub fn parse_port_argument(arg: &str) -> Result<SocketAddrV4, FtpError> {
    let parts: Vec<&str> = arg.trim().split(',').map(str::trim).collect();
    if parts.len() != 6 {
        return Err(FtpError::MalformedArgument(format!(
            "PORT expects 6 fields, got {}",
            parts.len()
        )));
    }

    let fields: Result<Vec<u8>, _> = parts.iter().map(|x| x.parse::<u8>()).collect();
    let fields =
        fields.map_err(|e| FtpError::MalformedArgument(format!("PORT field: {}", e)))?;

    let ip = Ipv4Addr::new(fields[0], fields[1], fields[2], fields[3]);
    let port = 256 * u16::from(fields[4]) + u16::from(fields[5]);
    debug!("PORT target {}:{}", ip, port);

    Ok(SocketAddrV4::new(ip, port))
}

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// PORT: switches to active mode. The connection to the client is only
    /// made when a transfer needs it.
    pub(crate) fn handle_port(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let target = parse_port_argument(required(arg, "PORT")?)?;
        info!("Active mode, data target {}", target);
        self.data.enter_active(target);
        self.reply(Reply::PortOk);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_argument() {
        let addr = parse_port_argument("192,168,1,20,8,73").unwrap();
        assert_eq!(addr, "192.168.1.20:2121".parse().unwrap());
    }

    #[test]
    fn test_parse_port_tolerates_spaces_and_terminator() {
        let addr = parse_port_argument(" 10, 0, 0, 1, 0, 21\r\n").unwrap();
        assert_eq!(addr, "10.0.0.1:21".parse().unwrap());
    }

    #[test]
    fn test_parse_port_rejects_bad_input() {
        assert!(parse_port_argument("1,2,3,4,5").is_err());
        assert!(parse_port_argument("1,2,3,4,5,6,7").is_err());
        assert!(parse_port_argument("256,0,0,1,0,21").is_err());
        assert!(parse_port_argument("a,b,c,d,e,f").is_err());
        assert!(parse_port_argument("").is_err());
    }
}

use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::{size_reply, SIZE_UNKNOWN};
use crate::core_network::SocketPool;
use crate::session::Session;
use log::warn;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    pub(crate) fn handle_size(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let path = required(arg, "SIZE")?;
        match self.fs.stat(path) {
            Ok(stat) => self.send_line(&size_reply(stat.size)),
            Err(e) => {
                warn!("SIZE {} failed: {}", path, e);
                self.send_line(SIZE_UNKNOWN);
            }
        }
        Ok(())
    }
}

use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::session::Session;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    pub(crate) fn handle_noop(&mut self) -> Result<(), FtpError> {
        self.reply(Reply::Ok);
        Ok(())
    }
}

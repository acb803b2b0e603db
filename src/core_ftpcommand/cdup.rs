use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::session::Session;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// CDUP: one level up, staying at `/` when already there.
    pub(crate) fn handle_cdup(&mut self) -> Result<(), FtpError> {
        self.fs
            .change_dir("..")
            .map_err(FtpError::DirectoryNotFound)?;
        self.reply(Reply::Ok);
        Ok(())
    }
}

use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::session::Session;
use log::info;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    pub(crate) fn handle_cwd(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let path = required(arg, "CWD")?;
        self.fs
            .change_dir(path)
            .map_err(FtpError::DirectoryNotFound)?;
        info!("Changed directory to {}", self.fs.current_dir());
        self.reply(Reply::CommandOk);
        Ok(())
    }
}

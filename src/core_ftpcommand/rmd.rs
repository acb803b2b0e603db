use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::session::Session;
use log::info;
use std::io::ErrorKind;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// RMD: only empty directories can go.
    pub(crate) fn handle_rmd(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let path = required(arg, "RMD")?;
        self.with_write_access(|session| {
            session.fs.remove_dir(path).map_err(|e| match e.kind() {
                ErrorKind::DirectoryNotEmpty => FtpError::DirectoryNotEmpty(path.to_string()),
                _ => FtpError::DirectoryNotFound(e),
            })
        })?;
        info!("Removed directory {}", path);
        self.reply(Reply::CommandOk);
        Ok(())
    }
}

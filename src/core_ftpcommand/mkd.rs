use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::session::Session;
use log::info;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    pub(crate) fn handle_mkd(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let path = required(arg, "MKD")?;
        self.with_write_access(|session| {
            session
                .fs
                .make_dir(path)
                .map_err(FtpError::DirectoryNotFound)
        })?;
        info!("Created directory {}", path);
        self.reply(Reply::CommandOk);
        Ok(())
    }
}

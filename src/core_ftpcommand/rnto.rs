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
    /// RNTO: renames the path staged by RNFR. The staged path is consumed
    /// whatever the outcome.
    pub(crate) fn handle_rnto(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let source = self.rename_source.take();
        let target = required(arg, "RNTO")?;
        let source = source.ok_or(FtpError::NoRenameSource)?;

        self.with_write_access(|session| {
            session.fs.rename(&source, target).map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists | ErrorKind::InvalidInput => {
                    FtpError::FilenameNotAllowed(target.to_string())
                }
                _ => FtpError::FileNotFound(e),
            })
        })?;
        info!("Renamed {} to {}", source, target);
        self.reply(Reply::CommandOk);
        Ok(())
    }
}

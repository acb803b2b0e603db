use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::session::Session;
use log::debug;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// RNFR: stages the source of the next RNTO. Existence is checked by
    /// RNTO itself.
    pub(crate) fn handle_rnfr(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let path = required(arg, "RNFR")?;
        debug!("Rename source staged: {}", path);
        self.rename_source = Some(path.to_string());
        self.reply(Reply::ReadyForRnto);
        Ok(())
    }
}

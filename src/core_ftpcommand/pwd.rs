use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::responses::pwd_reply;
use crate::core_network::SocketPool;
use crate::session::Session;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// PWD: `257 "<cwd>".`
    pub(crate) fn handle_pwd(&mut self) -> Result<(), FtpError> {
        let line = pwd_reply(&self.fs.current_dir());
        self.send_line(&line);
        Ok(())
    }
}

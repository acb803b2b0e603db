use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::core_transfer::TransferMode;
use crate::session::Session;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// TYPE: `I` selects binary, anything else falls back to ascii.
    pub(crate) fn handle_type(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let mode = required(arg, "TYPE")?;
        if mode.trim() == "I" {
            self.mode = TransferMode::Binary;
            self.reply(Reply::BinaryMode);
        } else {
            self.mode = TransferMode::Ascii;
            self.reply(Reply::AsciiMode);
        }
        Ok(())
    }
}

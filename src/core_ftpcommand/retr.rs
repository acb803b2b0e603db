use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::{send_all, SocketPool};
use crate::core_transfer::TransferMode;
use crate::session::Session;
use log::info;
use std::io::{self, ErrorKind, Read};

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// Handles the RETR (Retrieve) FTP command.
    ///
    /// The file is read in `transfer_chunk` sized pieces and every piece is
    /// pushed through the data channel until fully sent, retrying partial
    /// sends. In ascii mode the pieces are transcoded first. The data channel
    /// is released on every path.
    pub(crate) fn handle_retr(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let result = required(arg, "RETR")
            .and_then(|path| self.send_file(path).map(|sent| (path, sent)));
        self.data.disable();
        let (path, sent) = result?;
        info!("Sent file {} ({} bytes)", path, sent);
        self.reply(Reply::TransferComplete);
        Ok(())
    }

    fn send_file(&mut self, path: &str) -> Result<u64, FtpError> {
        self.enable_data()?;
        let mut file = self.fs.open_read(path).map_err(FtpError::FileNotFound)?;
        self.reply(Reply::FileStart);

        let ascii = self.mode == TransferMode::Ascii;
        self.codec.reset();
        let mut sent = 0u64;
        loop {
            let size = match file.read(&mut self.tx) {
                Ok(0) => break,
                Ok(size) => size,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FtpError::TransferAborted(e)),
            };
            let stream = self.data.stream_mut().ok_or_else(|| {
                FtpError::TransferAborted(io::Error::new(
                    ErrorKind::NotConnected,
                    "data channel closed",
                ))
            })?;
            let chunk = if ascii {
                self.codec.transcode(&self.tx[..size])
            } else {
                &self.tx[..size]
            };
            send_all(stream, chunk).map_err(FtpError::TransferAborted)?;
            sent += size as u64;
        }

        if ascii {
            if let Some(stream) = self.data.stream_mut() {
                send_all(stream, self.codec.finish()).map_err(FtpError::TransferAborted)?;
            }
        }
        Ok(sent)
    }
}

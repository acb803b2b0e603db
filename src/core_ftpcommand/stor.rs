use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::{Filesystem, WriteMode};
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::{upload_start_reply, Reply};
use crate::core_network::network::{is_transient, Connection};
use crate::core_network::SocketPool;
use crate::core_transfer::TransferMode;
use crate::session::Session;
use log::{debug, info, warn};
use std::io::Write;

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// Handles STOR (`WriteMode::Truncate`) and APPE (`WriteMode::Append`).
    ///
    /// Read-only servers refuse before touching the filesystem. Otherwise the
    /// upload runs with storage unlocked: incoming chunks land in the write
    /// cache, which is written out whenever the next chunk would fill it and
    /// once more at the end.
    pub(crate) fn handle_stor(&mut self, arg: Option<&str>, mode: WriteMode) -> Result<(), FtpError> {
        let verb = match mode {
            WriteMode::Truncate => "STOR",
            WriteMode::Append => "APPE",
        };
        let result = required(arg, verb)
            .and_then(|path| self.store_file(path, verb, mode).map(|received| (path, received)));
        self.data.disable();
        let (path, received) = result?;

        info!("Stored file {} ({} bytes)", path, received);
        self.reply(Reply::TransferComplete);
        Ok(())
    }

    fn store_file(&mut self, path: &str, verb: &str, mode: WriteMode) -> Result<u64, FtpError> {
        if self.read_only {
            warn!("{} {} refused, server is read-only", verb, path);
            return Err(FtpError::ReadOnly);
        }
        self.enable_data()?;
        self.with_write_access(|session| session.receive_file(path, mode))
    }

    fn receive_file(&mut self, path: &str, mode: WriteMode) -> Result<u64, FtpError> {
        if mode == WriteMode::Append {
            self.fs.stat(path).map_err(FtpError::FileNotFound)?;
        }
        let mut file = self
            .fs
            .open_write(path, mode)
            .map_err(FtpError::FileNotFound)?;
        self.send_line(&upload_start_reply(path));

        let ascii = self.mode == TransferMode::Ascii;
        self.codec.reset();
        self.cache.clear();
        let mut received = 0u64;

        while let Some(stream) = self.data.stream_mut() {
            match stream.recv(self.rx.as_mut_slice()) {
                Ok(0) => break,
                Ok(size) => {
                    received += size as u64;
                    let chunk = if ascii {
                        self.codec.transcode(self.rx.filled(size))
                    } else {
                        self.rx.filled(size)
                    };
                    self.cache
                        .push(chunk, &mut file)
                        .map_err(FtpError::TransferAborted)?;
                }
                Err(e) if is_transient(&e) => {
                    if stream.probe().is_err() {
                        break;
                    }
                    std::hint::spin_loop();
                }
                Err(e) => {
                    debug!("Data channel ended: {}", e);
                    break;
                }
            }
        }

        if ascii {
            let tail = self.codec.finish();
            self.cache
                .push(tail, &mut file)
                .map_err(FtpError::TransferAborted)?;
        }
        self.cache
            .flush(&mut file)
            .map_err(FtpError::TransferAborted)?;
        file.flush().map_err(FtpError::TransferAborted)?;
        Ok(received)
    }
}

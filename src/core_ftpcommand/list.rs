use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::{join_path, Filesystem};
use crate::core_ftpcommand::listing::format_entry_in;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::{send_all, SocketPool};
use crate::session::Session;
use log::{debug, info};
use std::io::{self, ErrorKind};

/// Drops leading `ls` style flags such as `-la` from a LIST argument.
fn strip_flags(arg: &str) -> Option<&str> {
    let mut rest = arg.trim();
    while rest.starts_with('-') {
        rest = match rest.split_once(' ') {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    Some(rest).filter(|rest| !rest.is_empty())
}

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// LIST and NLST: one `ls -l` style line per entry of the target
    /// directory (the current one by default) over the data channel. The
    /// data channel is released whatever the outcome.
    pub(crate) fn handle_list(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let result = self.list_target(arg);
        self.data.disable();
        let (target, count) = result?;

        info!("Listed {} ({} entries)", target, count);
        self.reply(Reply::ListingDone);
        Ok(())
    }

    fn list_target(&mut self, arg: Option<&str>) -> Result<(String, usize), FtpError> {
        let target = match arg.and_then(strip_flags) {
            Some(path) => path.to_string(),
            None => self.fs.current_dir(),
        };

        match self.fs.stat(&target) {
            Ok(stat) if stat.is_dir() => {}
            _ => return Err(FtpError::NotADirectory(target)),
        }
        let names = self
            .fs
            .list_dir(&target)
            .map_err(|_| FtpError::NotADirectory(target.clone()))?;

        self.reply(Reply::ListingStart);
        self.send_listing(&target, &names)?;
        Ok((target, names.len()))
    }

    fn send_listing(&mut self, target: &str, names: &[String]) -> Result<(), FtpError> {
        self.enable_data()?;
        for name in names {
            let stat = match self.fs.stat(&join_path(target, name)) {
                Ok(stat) => stat,
                Err(e) => {
                    debug!("Skipping {} in listing: {}", name, e);
                    continue;
                }
            };
            let line = format_entry_in(name, &stat, self.local_time);
            let stream = self.data.stream_mut().ok_or_else(|| {
                FtpError::DataChannel(io::Error::new(ErrorKind::NotConnected, "data channel closed"))
            })?;
            send_all(stream, line.as_bytes()).map_err(FtpError::TransferAborted)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_flags() {
        assert_eq!(strip_flags("-la"), None);
        assert_eq!(strip_flags("-la music"), Some("music"));
        assert_eq!(strip_flags("-l -a /pub"), Some("/pub"));
        assert_eq!(strip_flags("docs"), Some("docs"));
        assert_eq!(strip_flags("  "), None);
    }
}

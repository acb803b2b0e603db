use crate::clock::Clock;
use crate::core_error::FtpError;
use crate::core_fs::{Filesystem, WriteMode};
use crate::core_ftpcommand::ftpcommand::{CommandLine, FtpCommand};
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::session::Session;
use log::{error, log, warn};

/// Returns the argument of `verb` or the `501` error for a missing one.
pub(crate) fn required<'a>(arg: Option<&'a str>, verb: &'static str) -> Result<&'a str, FtpError> {
    arg.ok_or(FtpError::MissingArgument(verb))
}

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// Parses one control line and runs its handler.
    ///
    /// Unknown verbs get `501`. Everything but USER, PASS and QUIT is refused
    /// with `530` before login, without touching the filesystem or the data
    /// channel. Handler errors become their catalog reply here.
    pub(crate) fn dispatch(&mut self, line: &str) {
        let Some(parsed) = CommandLine::parse(line) else {
            return;
        };

        let command = parsed.command();
        if command == Some(FtpCommand::PASS) {
            log!(self.traffic_level(), "> PASS ****");
        } else {
            log!(self.traffic_level(), "> {}", line.trim_end());
        }

        let Some(command) = command else {
            warn!("Unknown command: {}", parsed.verb);
            self.reply(Reply::SyntaxError);
            return;
        };

        if command.requires_login() && !self.auth_state.is_authenticated() {
            warn!("{:?} refused, client is not logged in", command);
            self.reply(Reply::NotLoggedIn);
            return;
        }

        let arg = parsed.arg;
        let result = match command {
            FtpCommand::USER => self.handle_user(arg),
            FtpCommand::PASS => self.handle_pass(arg),
            FtpCommand::SYST => self.handle_syst(),
            FtpCommand::PWD => self.handle_pwd(),
            FtpCommand::CWD => self.handle_cwd(arg),
            FtpCommand::CDUP => self.handle_cdup(),
            FtpCommand::LIST | FtpCommand::NLST => self.handle_list(arg),
            FtpCommand::PORT => self.handle_port(arg),
            FtpCommand::SIZE => self.handle_size(arg),
            FtpCommand::TYPE => self.handle_type(arg),
            FtpCommand::PASV => self.handle_pasv(),
            FtpCommand::NOOP => self.handle_noop(),
            FtpCommand::RETR => self.handle_retr(arg),
            FtpCommand::STOR => self.handle_stor(arg, WriteMode::Truncate),
            FtpCommand::APPE => self.handle_stor(arg, WriteMode::Append),
            FtpCommand::DELE => self.handle_dele(arg),
            FtpCommand::RMD => self.handle_rmd(arg),
            FtpCommand::MKD => self.handle_mkd(arg),
            FtpCommand::RNFR => self.handle_rnfr(arg),
            FtpCommand::RNTO => self.handle_rnto(arg),
            FtpCommand::QUIT => self.handle_quit(),
        };

        if let Err(e) = result {
            if e.is_client_error() {
                warn!("{:?} failed: {}", command, e);
            } else {
                error!("{:?} failed: {}", command, e);
            }
            self.reply(e.to_reply());
        }
    }
}

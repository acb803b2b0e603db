use crate::clock::Clock;
use crate::core_auth::AuthState;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::handlers::required;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::session::Session;
use log::{info, warn};

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// USER: logs in password-less users straight away, otherwise waits for
    /// PASS. Unknown users get `501` and nothing changes.
    pub(crate) fn handle_user(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        let username = required(arg, "USER")?;

        if self.credentials.is_empty() {
            self.reply(Reply::LoggedIn);
            return Ok(());
        }

        match self.credentials.requires_password(username) {
            None => {
                warn!("Unknown user: {}", username);
                self.reply(Reply::SyntaxError);
            }
            Some(false) => {
                info!("Logged in {} (no password)", username);
                self.auth_state = AuthState::Authenticated(username.to_string());
                self.auth_deadline = None;
                self.reply(Reply::LoggedIn);
            }
            Some(true) => {
                self.auth_state = AuthState::UsernamePending(username.to_string());
                if self.auth_deadline.is_none() {
                    self.auth_deadline = Some(self.clock.now() + self.auth_timeout);
                }
                self.reply(Reply::NeedPassword);
            }
        }
        Ok(())
    }
}

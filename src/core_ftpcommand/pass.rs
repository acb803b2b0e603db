use crate::clock::Clock;
use crate::core_auth::AuthState;
use crate::core_error::FtpError;
use crate::core_fs::Filesystem;
use crate::core_ftpcommand::responses::Reply;
use crate::core_network::SocketPool;
use crate::session::Session;
use log::{info, warn};

impl<P: SocketPool, F: Filesystem, C: Clock> Session<P, F, C> {
    /// PASS: a wrong password ends the connection.
    pub(crate) fn handle_pass(&mut self, arg: Option<&str>) -> Result<(), FtpError> {
        match &self.auth_state {
            AuthState::UsernamePending(username) => {
                let username = username.clone();
                if self.credentials.verify(&username, arg.unwrap_or("")) {
                    info!("Logged in {}", username);
                    self.auth_state = AuthState::Authenticated(username);
                    self.auth_deadline = None;
                    self.reply(Reply::LoggedIn);
                } else {
                    warn!("Wrong password for {}, disconnecting", username);
                    self.reply(Reply::NotLoggedIn);
                    self.disconnect();
                }
            }
            AuthState::Authenticated(_) => self.reply(Reply::LoggedIn),
            AuthState::Unauthenticated => self.reply(Reply::SyntaxError),
        }
        Ok(())
    }
}

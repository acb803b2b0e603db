//! A single-connection FTP server that runs cooperatively inside a host loop.
//!
//! The host owns an [`FtpServer`] and calls [`FtpServer::poll`] repeatedly.
//! Sockets, storage and time are reached through the [`SocketPool`],
//! [`Filesystem`] and [`Clock`] traits; std-backed implementations of all
//! three are included.

pub mod clock;
pub mod config;
pub mod constants;
pub mod core_auth;
pub mod core_cli;
pub mod core_error;
pub mod core_fs;
pub mod core_ftpcommand;
pub mod core_network;
pub mod core_transfer;
pub mod helpers;
pub mod server;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use core_auth::{AuthState, CredentialTable};
pub use core_error::{ConfigError, FtpError, SetupError};
pub use core_fs::{Filesystem, LocalFilesystem};
pub use core_network::{SocketPool, StdSocketPool};
pub use core_transfer::TransferMode;
pub use server::FtpServer;
pub use session::{Session, SessionConfig};

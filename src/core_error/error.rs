// Error types for the session engine and its configuration
use crate::core_ftpcommand::responses::Reply;
use std::io;
use thiserror::Error;

/// Failure of a single command. Never leaves `poll()`: the dispatcher turns it
/// into a status line with [`FtpError::to_reply`].
#[derive(Error, Debug)]
pub enum FtpError {
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),

    #[error("malformed argument: {0}")]
    MalformedArgument(String),

    #[error("storage is read-only")]
    ReadOnly,

    #[error("storage could not be unlocked for writing: {0}")]
    StorageLocked(#[source] io::Error),

    #[error("file not found: {0}")]
    FileNotFound(#[source] io::Error),

    #[error("directory not found: {0}")]
    DirectoryNotFound(#[source] io::Error),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("file name not allowed: {0}")]
    FilenameNotAllowed(String),

    #[error("listing target is not a directory: {0}")]
    NotADirectory(String),

    #[error("RNTO without a staged RNFR source")]
    NoRenameSource,

    #[error("data channel could not be opened: {0}")]
    DataChannel(#[source] io::Error),

    #[error("client did not connect to the passive port in time")]
    PassiveTimeout,

    #[error("transfer aborted: {0}")]
    TransferAborted(#[source] io::Error),
}

impl FtpError {
    pub fn to_reply(&self) -> Reply {
        match self {
            FtpError::MissingArgument(_)
            | FtpError::MalformedArgument(_)
            | FtpError::NoRenameSource => Reply::SyntaxError,
            FtpError::ReadOnly | FtpError::StorageLocked(_) => Reply::StorageNotAllowed,
            FtpError::FileNotFound(_) => Reply::FileNotFound,
            FtpError::DirectoryNotFound(_) => Reply::DirectoryNotFound,
            FtpError::DirectoryNotEmpty(_) => Reply::DirectoryNotEmpty,
            FtpError::FilenameNotAllowed(_) => Reply::FilenameNotAllowed,
            FtpError::NotADirectory(_) => Reply::ListingPathNotFound,
            FtpError::DataChannel(_)
            | FtpError::PassiveTimeout
            | FtpError::TransferAborted(_) => Reply::LocalError,
        }
    }

    /// Whether the failure is the client's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FtpError::MissingArgument(_)
                | FtpError::MalformedArgument(_)
                | FtpError::NoRenameSource
                | FtpError::ReadOnly
        )
    }
}

/// Invalid server or session settings.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("cache must be at least {min} times the buffer, got {got}")]
    CacheTooSmall { min: usize, got: usize },

    #[error("{0} must be at least 1")]
    ZeroSize(&'static str),

    #[error("auth_timeout must be a finite number of seconds >= 0, got {0}")]
    InvalidAuthTimeout(f64),

    #[error("invalid username in credential table: {0:?}")]
    InvalidUsername(String),

    #[error("invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("malformed passwd line {line}: {content:?}")]
    MalformedPasswdLine { line: usize, content: String },
}

/// Failure while constructing a server.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddrV4,
        #[source]
        source: io::Error,
    },
}

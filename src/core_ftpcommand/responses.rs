//! Canned status lines sent on the control channel.
//!
//! Every fixed reply the server can emit lives in one ordinal table. Replies
//! that carry data (PASV, SIZE, PWD, the STOR banner) are formatted by their
//! handlers instead.

/// A fixed control-channel reply, indexed by its position in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Reply {
    SyntaxError = 0,
    LoggedIn = 1,
    NeedPassword = 2,
    Welcome = 3,
    SystemType = 4,
    DirectoryNotFound = 5,
    CommandOk = 6,
    NotLoggedIn = 7,
    ListingStart = 8,
    ListingPathNotFound = 9,
    ListingDone = 10,
    PortOk = 11,
    BinaryMode = 12,
    AsciiMode = 13,
    Ok = 14,
    Goodbye = 15,
    ServiceNotAvailable = 16,
    FileStart = 17,
    FileNotFound = 18,
    TransferComplete = 19,
    StorageNotAllowed = 20,
    DirectoryNotEmpty = 21,
    ReadyForDestination = 22,
    FilenameNotAllowed = 23,
    ReadyForRnto = 24,
    LocalError = 25,
}

const MESSAGES: [&str; 26] = [
    "501 Syntax error in parameters or arguments.",
    "230 User logged in, proceed.",
    "331 User name okay, need password.",
    "220 Welcome!",
    "215 UNIX Type: L8.",
    "550 Failed Directory not exists.",
    "250 Command successful.",
    "530 User not logged in.",
    "150 Here is listing.",
    "550 LIST failed Path name not exists.",
    "226 List done.",
    "200 Get port.",
    "200 Binary mode.",
    "200 Ascii mode.",
    "200 Ok.",
    "221 Goodbye!",
    "421 Service not available.",
    "150 Here is the file.",
    "550 File not found",
    "226 Transfer complete",
    "550 Requested action not taken. File storage is not allowed on this server.",
    "550 Directory not empty",
    "350 File or directory exists, ready for destination name.",
    "553 Requested action not taken. File name not allowed.",
    "350 Ready for RNTO.",
    "451 Requested action aborted: local error in processing.",
];

impl Reply {
    pub fn index(self) -> usize {
        self as usize
    }

    /// The status line without its terminator.
    pub fn text(self) -> &'static str {
        MESSAGES[self.index()]
    }

    /// The three digit reply code.
    pub fn code(self) -> u16 {
        // Every catalog entry starts with three ASCII digits.
        self.text()[..3].parse().unwrap_or(0)
    }
}

/// Appends the protocol line terminator.
pub fn format_line(text: &str) -> String {
    format!("{}\r\n", text)
}

/// `227` reply advertising a passive endpoint.
pub fn pasv_reply(octets: [u8; 4], port: u16) -> String {
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{}).",
        octets[0],
        octets[1],
        octets[2],
        octets[3],
        port / 256,
        port % 256
    )
}

pub fn size_reply(size: u64) -> String {
    format!("213 {}", size)
}

pub fn pwd_reply(cwd: &str) -> String {
    format!("257 \"{}\".", cwd)
}

pub fn upload_start_reply(name: &str) -> String {
    format!("150 Opening data connection for {}", name)
}

pub const SIZE_UNKNOWN: &str = "550 SIZE could not be detected.";

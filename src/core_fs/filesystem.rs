use std::io::{self, Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// The metadata the listing and SIZE commands need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStat {
    pub kind: EntryKind,
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub modified: i64,
}

impl EntryStat {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}

/// Filesystem capability consumed by the session.
///
/// Paths are the client's view: absolute (`/a/b`) or relative to
/// [`Filesystem::current_dir`]. Mutating calls are only expected to succeed
/// between `set_writable(true)` and `set_writable(false)`.
pub trait Filesystem {
    type Reader: Read;
    type Writer: Write;

    fn current_dir(&self) -> String;
    fn change_dir(&mut self, path: &str) -> io::Result<()>;
    /// Back to the root, called when a client disconnects.
    fn reset_dir(&mut self);

    /// Names of the entries of a directory.
    fn list_dir(&self, path: &str) -> io::Result<Vec<String>>;
    fn stat(&self, path: &str) -> io::Result<EntryStat>;

    fn make_dir(&mut self, path: &str) -> io::Result<()>;
    fn remove_dir(&mut self, path: &str) -> io::Result<()>;
    fn remove_file(&mut self, path: &str) -> io::Result<()>;
    fn rename(&mut self, from: &str, to: &str) -> io::Result<()>;

    fn open_read(&mut self, path: &str) -> io::Result<Self::Reader>;
    fn open_write(&mut self, path: &str, mode: WriteMode) -> io::Result<Self::Writer>;

    /// Unlocks (`true`) or write-protects (`false`) the storage medium.
    fn set_writable(&mut self, writable: bool) -> io::Result<()>;
}

/// Joins a listing target and an entry name the way the client sees them.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

//! [`Filesystem`] backed by a directory on the host, used as the FTP root.

use crate::core_fs::filesystem::{EntryKind, EntryStat, Filesystem, WriteMode};
use log::{debug, error, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Debug)]
pub struct LocalFilesystem {
    root: PathBuf,
    current_dir: String,
    writable: bool,
}

impl LocalFilesystem {
    /// Roots the filesystem at `root`, which must be an existing directory.
    /// Storage starts write-protected.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                ErrorKind::NotFound,
                format!("root {:?} is not a directory", root),
            ));
        }
        Ok(Self {
            root,
            current_dir: String::from("/"),
            writable: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Normalizes a client path into an absolute virtual path. `..` never
    /// climbs above `/`.
    pub fn virtual_path(&self, path: &str) -> String {
        let joined = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("{}/{}", self.current_dir, path)
        };

        let mut parts: Vec<&str> = Vec::new();
        for component in joined.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        format!("/{}", parts.join("/"))
    }

    /// Maps a client path to a host path inside the root.
    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let virtual_path = self.virtual_path(path);
        let real = self.root.join(virtual_path.trim_start_matches('/'));

        // Symlinks may still point outside the root.
        if let Ok(canonical) = real.canonicalize() {
            if !canonical.starts_with(&self.root) {
                error!("Path is outside of the allowed area: {:?}", canonical);
                return Err(io::Error::new(
                    ErrorKind::PermissionDenied,
                    "path is outside of the allowed area",
                ));
            }
        }
        Ok(real)
    }

    fn ensure_writable(&self) -> io::Result<()> {
        if self.writable {
            Ok(())
        } else {
            warn!("Write attempted while storage is write-protected");
            Err(io::Error::new(
                ErrorKind::PermissionDenied,
                "storage is write-protected",
            ))
        }
    }
}

impl Filesystem for LocalFilesystem {
    type Reader = File;
    type Writer = File;

    fn current_dir(&self) -> String {
        self.current_dir.clone()
    }

    fn change_dir(&mut self, path: &str) -> io::Result<()> {
        let real = self.resolve(path)?;
        if !fs::metadata(&real)?.is_dir() {
            return Err(io::Error::new(ErrorKind::NotFound, "not a directory"));
        }
        self.current_dir = self.virtual_path(path);
        debug!("Directory changed to: {}", self.current_dir);
        Ok(())
    }

    fn reset_dir(&mut self) {
        self.current_dir = String::from("/");
    }

    fn list_dir(&self, path: &str) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.resolve(path)?)? {
            match entry {
                Ok(entry) => names.push(entry.file_name().to_string_lossy().into_owned()),
                Err(e) => warn!("Failed to read directory entry: {}", e),
            }
        }
        names.sort();
        Ok(names)
    }

    fn stat(&self, path: &str) -> io::Result<EntryStat> {
        let metadata = fs::metadata(self.resolve(path)?)?;
        let modified = metadata
            .modified()
            .ok()
            .map(|time| match time.duration_since(UNIX_EPOCH) {
                Ok(after) => after.as_secs() as i64,
                Err(before) => -(before.duration().as_secs() as i64),
            })
            .unwrap_or(0);

        Ok(EntryStat {
            kind: if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            },
            size: metadata.len(),
            modified,
        })
    }

    fn make_dir(&mut self, path: &str) -> io::Result<()> {
        self.ensure_writable()?;
        fs::create_dir(self.resolve(path)?)
    }

    fn remove_dir(&mut self, path: &str) -> io::Result<()> {
        self.ensure_writable()?;
        if self.virtual_path(path) == "/" {
            return Err(io::Error::new(
                ErrorKind::PermissionDenied,
                "refusing to remove the root",
            ));
        }
        fs::remove_dir(self.resolve(path)?)
    }

    fn remove_file(&mut self, path: &str) -> io::Result<()> {
        self.ensure_writable()?;
        fs::remove_file(self.resolve(path)?)
    }

    fn rename(&mut self, from: &str, to: &str) -> io::Result<()> {
        self.ensure_writable()?;
        if self.virtual_path(to) == "/" || self.virtual_path(from) == "/" {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "the root cannot be renamed",
            ));
        }
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if !source.exists() {
            return Err(io::Error::new(ErrorKind::NotFound, "rename source missing"));
        }
        if target.exists() {
            return Err(io::Error::new(
                ErrorKind::AlreadyExists,
                "rename target already exists",
            ));
        }
        fs::rename(source, target)
    }

    fn open_read(&mut self, path: &str) -> io::Result<File> {
        let real = self.resolve(path)?;
        if !fs::metadata(&real)?.is_file() {
            return Err(io::Error::new(ErrorKind::NotFound, "not a regular file"));
        }
        File::open(real)
    }

    fn open_write(&mut self, path: &str, mode: WriteMode) -> io::Result<File> {
        self.ensure_writable()?;
        let real = self.resolve(path)?;
        let mut options = OpenOptions::new();
        match mode {
            WriteMode::Truncate => options.write(true).create(true).truncate(true),
            WriteMode::Append => options.append(true),
        };
        options.open(real)
    }

    fn set_writable(&mut self, writable: bool) -> io::Result<()> {
        if writable && fs::metadata(&self.root)?.permissions().readonly() {
            return Err(io::Error::new(
                ErrorKind::PermissionDenied,
                "storage root is mounted read-only",
            ));
        }
        self.writable = writable;
        debug!(
            "Storage {}",
            if writable { "unlocked for writing" } else { "write-protected" }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalFilesystem) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("music")).unwrap();
        fs::write(dir.path().join("music/song.mp3"), b"la la").unwrap();
        fs::write(dir.path().join("readme.txt"), b"hello").unwrap();
        let local = LocalFilesystem::new(dir.path()).unwrap();
        (dir, local)
    }

    #[test]
    fn test_virtual_path_never_escapes_root() {
        let (_dir, mut local) = setup();
        assert_eq!(local.virtual_path("../../etc/passwd"), "/etc/passwd");
        assert_eq!(local.virtual_path("/a/./b/../c"), "/a/c");

        local.change_dir("music").unwrap();
        assert_eq!(local.current_dir(), "/music");
        assert_eq!(local.virtual_path("song.mp3"), "/music/song.mp3");
        assert_eq!(local.virtual_path(".."), "/");

        local.change_dir("..").unwrap();
        assert_eq!(local.current_dir(), "/");
        local.change_dir("..").unwrap();
        assert_eq!(local.current_dir(), "/");
    }

    #[test]
    fn test_change_dir_requires_directory() {
        let (_dir, mut local) = setup();
        assert!(local.change_dir("readme.txt").is_err());
        assert!(local.change_dir("missing").is_err());
        assert_eq!(local.current_dir(), "/");
    }

    #[test]
    fn test_list_and_stat() {
        let (_dir, local) = setup();
        assert_eq!(local.list_dir("/").unwrap(), vec!["music", "readme.txt"]);

        let stat = local.stat("readme.txt").unwrap();
        assert_eq!(stat.kind, EntryKind::File);
        assert_eq!(stat.size, 5);
        assert!(stat.modified > 0);
        assert!(local.stat("music").unwrap().is_dir());
    }

    #[test]
    fn test_mutations_need_unlocked_storage() {
        let (dir, mut local) = setup();
        let err = local.make_dir("new").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(!dir.path().join("new").exists());

        local.set_writable(true).unwrap();
        local.make_dir("new").unwrap();
        local.set_writable(false).unwrap();
        assert!(dir.path().join("new").is_dir());
        assert!(local.remove_dir("new").is_err());
    }

    #[test]
    fn test_write_and_append() {
        let (dir, mut local) = setup();
        local.set_writable(true).unwrap();
        local
            .open_write("notes.txt", WriteMode::Truncate)
            .unwrap()
            .write_all(b"one")
            .unwrap();
        local
            .open_write("notes.txt", WriteMode::Append)
            .unwrap()
            .write_all(b"two")
            .unwrap();
        assert!(local.open_write("absent.txt", WriteMode::Append).is_err());

        let mut contents = String::new();
        local
            .open_read("/notes.txt")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "onetwo");
        assert!(dir.path().join("notes.txt").exists());
        assert!(local.open_read("music").is_err());
    }

    #[test]
    fn test_rename_refuses_existing_target() {
        let (dir, mut local) = setup();
        local.set_writable(true).unwrap();
        let err = local.rename("readme.txt", "music").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(
            local.rename("missing", "other").unwrap_err().kind(),
            ErrorKind::NotFound
        );

        local.rename("readme.txt", "music/readme.txt").unwrap();
        assert!(dir.path().join("music/readme.txt").exists());
    }
}

pub mod filesystem;
pub mod local;

pub use filesystem::{join_path, EntryKind, EntryStat, Filesystem, WriteMode};
pub use local::LocalFilesystem;

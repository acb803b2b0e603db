// src/constants.rs

use std::time::Duration;

pub const USERNAME_REGEX: &str = r"^[A-Za-z0-9_.-]{1,32}$";

pub const DEFAULT_LISTEN_PORT: u16 = 21;
pub const DEFAULT_PASV_PORT: u16 = 20;

/// How many receive buffers worth of upload data are held before writing.
pub const DEFAULT_MAX_CACHE: usize = 5;
pub const MIN_CACHE_SLOTS: usize = 2;
pub const DEFAULT_MAX_BUFFER: usize = 2880;

/// Bytes read from a file per data-channel send during RETR.
pub const DEFAULT_TRANSFER_CHUNK: usize = 2048;

pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(120);
pub const PASV_ACCEPT_TIMEOUT: Duration = Duration::from_millis(1200);
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);
pub const ACTIVE_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// 2000-01-01 and 2038-01-01; device clocks outside this range are clamped.
pub const LISTING_MIN_MTIME: i64 = 946_684_800;
pub const LISTING_MAX_MTIME: i64 = 2_145_916_800;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

//! `ls -l` style lines for LIST and NLST.

use crate::constants::{LISTING_MAX_MTIME, LISTING_MIN_MTIME};
use crate::core_fs::{EntryKind, EntryStat};
use chrono::{Local, TimeZone, Utc};
use std::fmt::Display;

/// Formats one entry, CRLF included. `mtime` is clamped to a sane range
/// before conversion so bogus device clocks still produce a parseable line.
pub fn format_entry<Tz>(name: &str, stat: &EntryStat, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let prefix = match stat.kind {
        EntryKind::Directory => "drwxrwxrwx 2",
        EntryKind::File => "-rwxrwxrwx 1",
    };
    let mtime = stat.modified.clamp(LISTING_MIN_MTIME, LISTING_MAX_MTIME);
    let date = match Utc.timestamp_opt(mtime, 0).single() {
        Some(utc) => utc.with_timezone(tz).format("%b %-d %H:%M").to_string(),
        None => String::from("Jan 1 00:00"),
    };
    format!(
        "{} nobody nobody {} {} {}\r\n",
        prefix, stat.size, date, name
    )
}

/// Formats in UTC, or in the host's local time zone when `local_time` is set.
pub fn format_entry_in(name: &str, stat: &EntryStat, local_time: bool) -> String {
    if local_time {
        format_entry(name, stat, &Local)
    } else {
        format_entry(name, stat, &Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(kind: EntryKind, size: u64, modified: i64) -> EntryStat {
        EntryStat {
            kind,
            size,
            modified,
        }
    }

    #[test]
    fn test_file_line() {
        let mtime = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 0).unwrap().timestamp();
        assert_eq!(
            format_entry("a.txt", &stat(EntryKind::File, 42, mtime), &Utc),
            "-rwxrwxrwx 1 nobody nobody 42 Mar 5 09:07 a.txt\r\n"
        );
    }

    #[test]
    fn test_directory_line() {
        let mtime = Utc.with_ymd_and_hms(2021, 12, 24, 18, 30, 0).unwrap().timestamp();
        assert_eq!(
            format_entry_in("music", &stat(EntryKind::Directory, 0, mtime), false),
            "drwxrwxrwx 2 nobody nobody 0 Dec 24 18:30 music\r\n"
        );
    }

    #[test]
    fn test_mtime_is_clamped() {
        let before = format_entry("old", &stat(EntryKind::File, 1, 0), &Utc);
        assert_eq!(before, "-rwxrwxrwx 1 nobody nobody 1 Jan 1 00:00 old\r\n");

        let after = format_entry("new", &stat(EntryKind::File, 1, i64::MAX), &Utc);
        assert_eq!(after, "-rwxrwxrwx 1 nobody nobody 1 Jan 1 00:00 new\r\n");
    }
}

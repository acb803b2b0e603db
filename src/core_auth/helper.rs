use crate::core_auth::core_auth::{CredentialTable, PasswdEntry};
use crate::core_error::ConfigError;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};
use log::{info, warn};
use std::fs;
use std::path::Path;

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Checks `password` against a stored value. Values that look like bcrypt
/// hashes (`$2a$`, `$2b$`, `$2y$`) are verified as such, anything else is
/// compared verbatim.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.starts_with("$2") {
        verify(password, stored).unwrap_or_else(|e| {
            warn!("Stored password hash could not be checked: {}", e);
            false
        })
    } else {
        password == stored
    }
}

/// Parses passwd file contents into `table`. Blank lines and lines starting
/// with `#` are skipped.
pub fn parse_passwd(content: &str, table: &mut CredentialTable) -> Result<(), ConfigError> {
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry = PasswdEntry::from_line(line).ok_or_else(|| ConfigError::MalformedPasswdLine {
            line: index + 1,
            content: line.to_string(),
        })?;
        table.insert_entry(entry)?;
    }
    Ok(())
}

pub fn load_passwd_file(path: &Path, table: &mut CredentialTable) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read passwd file: {}", path.display()))?;
    parse_passwd(&content, table)
        .with_context(|| format!("Failed to parse passwd file: {}", path.display()))?;
    info!("Loaded passwd file {} ({} users)", path.display(), table.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bcrypt_and_plain_passwords() {
        let hashed = bcrypt::hash("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &hashed));
        assert!(!verify_password("hunter3", &hashed));
        assert!(verify_password("plain", "plain"));
        assert!(!verify_password("plain", "Plain"));
        assert!(!verify_password("x", "$2b$broken"));
    }

    #[test]
    fn test_parse_passwd() {
        let mut table = CredentialTable::new();
        parse_passwd("# users\nalice:secret\n\nguest:\n", &mut table).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.verify("alice", "secret"));
        assert_eq!(table.requires_password("guest"), Some(false));

        let err = parse_passwd("alice:secret\nbroken\n", &mut CredentialTable::new()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MalformedPasswdLine {
                line: 2,
                content: "broken".into()
            }
        );
    }

    #[test]
    fn test_load_passwd_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "carol:pw").unwrap();
        let mut table = CredentialTable::new();
        load_passwd_file(file.path(), &mut table).unwrap();
        assert!(table.verify("carol", "pw"));

        let missing = Path::new("/nonexistent/passwd");
        assert!(load_passwd_file(missing, &mut table).is_err());
    }
}

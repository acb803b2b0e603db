use crate::constants::USERNAME_REGEX;
use crate::core_auth::helper::verify_password;
use crate::core_error::ConfigError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// One `user:password` line of a passwd file. An empty password field means
/// the user logs in without one.
#[derive(Debug, Clone)]
pub struct PasswdEntry {
    username: String,
    password: Option<String>,
}

impl PasswdEntry {
    pub fn from_line(line: &str) -> Option<Self> {
        let (username, password) = line.split_once(':')?;
        if username.is_empty() || password.contains(':') {
            return None;
        }
        Some(PasswdEntry {
            username: username.to_string(),
            password: if password.is_empty() {
                None
            } else {
                Some(password.to_string())
            },
        })
    }

    pub fn get_password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    UsernamePending(String),
    Authenticated(String),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            AuthState::Unauthenticated => None,
            AuthState::UsernamePending(user) | AuthState::Authenticated(user) => Some(user),
        }
    }
}

fn username_regex() -> Option<&'static Regex> {
    static USERNAME: OnceLock<Option<Regex>> = OnceLock::new();
    USERNAME
        .get_or_init(|| Regex::new(USERNAME_REGEX).ok())
        .as_ref()
}

pub fn is_valid_username(name: &str) -> bool {
    username_regex().map_or(false, |re| re.is_match(name))
}

/// Static username → password table. `None` marks a password-less user.
/// An empty table disables authentication altogether.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    entries: HashMap<String, Option<String>>,
}

impl CredentialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, Option<S>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (user, password) in entries {
            table.insert(user, password.map(Into::into))?;
        }
        Ok(table)
    }

    pub fn insert(
        &mut self,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Result<(), ConfigError> {
        let username = username.into();
        if !is_valid_username(&username) {
            return Err(ConfigError::InvalidUsername(username));
        }
        self.entries.insert(username, password);
        Ok(())
    }

    pub fn insert_entry(&mut self, entry: PasswdEntry) -> Result<(), ConfigError> {
        let password = entry.get_password().map(str::to_string);
        self.insert(entry.username, password)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `None` for unknown users, otherwise whether a password is required.
    pub fn requires_password(&self, username: &str) -> Option<bool> {
        self.entries.get(username).map(Option::is_some)
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.entries.get(username) {
            Some(Some(stored)) => verify_password(password, stored),
            Some(None) => true,
            None => false,
        }
    }

    /// The state a freshly connected client starts in.
    pub fn initial_state(&self) -> AuthState {
        if self.is_empty() {
            AuthState::Authenticated(String::new())
        } else {
            AuthState::Unauthenticated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passwd_entry_from_line() {
        let entry = PasswdEntry::from_line("alice:secret").unwrap();
        assert_eq!(entry.get_username(), "alice");
        assert_eq!(entry.get_password(), Some("secret"));

        let open = PasswdEntry::from_line("guest:").unwrap();
        assert_eq!(open.get_password(), None);

        assert!(PasswdEntry::from_line("nocolon").is_none());
        assert!(PasswdEntry::from_line(":pw").is_none());
        assert!(PasswdEntry::from_line("a:b:c").is_none());
    }

    #[test]
    fn test_username_validation() {
        assert!(is_valid_username("user_1.name-x"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("with space"));
        assert!(!is_valid_username(&"x".repeat(33)));

        let mut table = CredentialTable::new();
        assert_eq!(
            table.insert("bad name", None),
            Err(ConfigError::InvalidUsername("bad name".into()))
        );
    }

    #[test]
    fn test_lookup_and_verify() {
        let table =
            CredentialTable::from_entries([("alice", Some("secret")), ("guest", None)]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.requires_password("alice"), Some(true));
        assert_eq!(table.requires_password("guest"), Some(false));
        assert_eq!(table.requires_password("mallory"), None);

        assert!(table.verify("alice", "secret"));
        assert!(!table.verify("alice", "Secret"));
        assert!(table.verify("guest", "anything"));
        assert!(!table.verify("mallory", "secret"));
    }

    #[test]
    fn test_initial_state() {
        assert_eq!(
            CredentialTable::new().initial_state(),
            AuthState::Authenticated(String::new())
        );
        let table = CredentialTable::from_entries([("bob", None::<&str>)]).unwrap();
        assert_eq!(table.initial_state(), AuthState::Unauthenticated);
        assert!(!table.initial_state().is_authenticated());
        assert_eq!(AuthState::UsernamePending("bob".into()).username(), Some("bob"));
    }
}

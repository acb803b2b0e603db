use crate::constants::{
    DEFAULT_AUTH_TIMEOUT, DEFAULT_LISTEN_PORT, DEFAULT_MAX_BUFFER, DEFAULT_MAX_CACHE,
    DEFAULT_PASV_PORT, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TRANSFER_CHUNK,
};
use crate::core_auth::{load_passwd_file, CredentialTable};
use crate::core_error::ConfigError;
use crate::session::SessionConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub listen_port: u16,
    pub pasv_port: u16,
    pub pasv_address: Option<String>,
    pub root_dir: String,
    pub max_cache: usize,
    pub max_buffer: usize,
    pub auth_timeout_secs: f64,
    pub transfer_chunk: usize,
    pub verbose: bool,
    pub read_only: bool,
    pub local_time: bool,
    pub poll_interval_ms: u64,
    pub passwd_file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0"),
            listen_port: DEFAULT_LISTEN_PORT,
            pasv_port: DEFAULT_PASV_PORT,
            pasv_address: None,
            root_dir: String::from("/var/ftp"),
            max_cache: DEFAULT_MAX_CACHE,
            max_buffer: DEFAULT_MAX_BUFFER,
            auth_timeout_secs: DEFAULT_AUTH_TIMEOUT.as_secs_f64(),
            transfer_chunk: DEFAULT_TRANSFER_CHUNK,
            verbose: false,
            read_only: false,
            local_time: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            passwd_file: None,
        }
    }
}

/// Contents of the TOML configuration file. `[users]` maps user names to
/// passwords; an empty password means none is asked.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub users: BTreeMap<String, String>,
}

fn parse_ipv4(value: &str) -> Result<Ipv4Addr, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidAddress(value.to_string()))
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.server.poll_interval_ms.max(1))
    }

    /// Credential table from `[users]` plus the optional passwd file.
    pub fn credentials(&self) -> Result<CredentialTable> {
        let mut table = CredentialTable::new();
        for (user, password) in &self.users {
            let password = Some(password.clone()).filter(|p| !p.is_empty());
            table.insert(user.clone(), password)?;
        }
        if let Some(path) = &self.server.passwd_file {
            load_passwd_file(Path::new(path), &mut table)?;
        }
        Ok(table)
    }

    /// Builds and validates the settings of the session engine.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let server = &self.server;
        let bind = SocketAddrV4::new(parse_ipv4(&server.bind_address)?, server.listen_port);
        let pasv_address = match &server.pasv_address {
            Some(address) if !address.trim().is_empty() => Some(parse_ipv4(address)?),
            _ => None,
        };

        let session = SessionConfig {
            bind,
            pasv_port: server.pasv_port,
            pasv_address,
            max_cache: server.max_cache,
            max_buffer: server.max_buffer,
            transfer_chunk: server.transfer_chunk,
            auth_timeout_secs: server.auth_timeout_secs,
            verbose: server.verbose,
            read_only: server.read_only,
            local_time: server.local_time,
            credentials: self.credentials()?,
        };
        session.validate()?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_for_missing_keys() {
        let config: Config = toml::from_str("[server]\nlisten_port = 2121\n").unwrap();
        assert_eq!(config.server.listen_port, 2121);
        assert_eq!(config.server.pasv_port, 20);
        assert_eq!(config.server.max_cache, 5);
        assert_eq!(config.server.max_buffer, 2880);
        assert_eq!(config.server.transfer_chunk, 2048);
        assert_eq!(config.server.auth_timeout_secs, 120.0);
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_session_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
bind_address = "127.0.0.1"
listen_port = 2121
pasv_address = "192.168.1.50"
read_only = true

[users]
alice = "secret"
guest = ""
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        let session = config.session_config().unwrap();
        assert_eq!(session.bind, "127.0.0.1:2121".parse().unwrap());
        assert_eq!(session.pasv_address, Some(Ipv4Addr::new(192, 168, 1, 50)));
        assert!(session.read_only);
        assert_eq!(session.credentials.requires_password("alice"), Some(true));
        assert_eq!(session.credentials.requires_password("guest"), Some(false));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut config = Config::default();
        config.server.bind_address = String::from("not-an-ip");
        let err = config.session_config().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidAddress("not-an-ip".into()))
        );

        let mut config = Config::default();
        config.server.max_cache = 1;
        assert!(config.session_config().is_err());

        let mut config = Config::default();
        config.users.insert(String::from("bad user"), String::new());
        assert!(config.session_config().is_err());
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = Config::load_from_file(Path::new("/nonexistent/pollftpd.conf")).unwrap_err();
        assert!(err.to_string().contains("Failed to read configuration file"));
    }
}

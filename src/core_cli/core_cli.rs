use crate::config::Config;
use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "pollftpd", about = "A single-client FTP server driven by a poll loop.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "")]
    pub config: String,

    /// Log every command and reply at info level
    #[arg(short, long)]
    pub verbose: bool,

    /// Refuse every command that writes to storage
    #[arg(long)]
    pub read_only: bool,

    /// Control port, overrides `listen_port`
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory served as `/`, overrides `root_dir`
    #[arg(short, long)]
    pub root: Option<String>,

    /// Exit after the first client disconnects
    #[arg(long)]
    pub once: bool,

    /// Print a bcrypt hash of the given password and exit
    #[arg(long, value_name = "PASSWORD")]
    pub hash_password: Option<String>,
}

impl Cli {
    /// Command-line flags win over the configuration file.
    pub fn apply(&self, config: &mut Config) {
        if self.verbose {
            config.server.verbose = true;
        }
        if self.read_only {
            config.server.read_only = true;
        }
        if let Some(port) = self.port {
            config.server.listen_port = port;
        }
        if let Some(root) = &self.root {
            config.server.root_dir = root.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["pollftpd", "-p", "2121", "--root", "/srv/ftp", "--read-only"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.server.listen_port, 2121);
        assert_eq!(config.server.root_dir, "/srv/ftp");
        assert!(config.server.read_only);
        assert!(!config.server.verbose);
        assert!(!cli.once);
    }

    #[test]
    fn test_hash_password_flag() {
        let cli = Cli::parse_from(["pollftpd", "--hash-password", "s3cret"]);
        assert_eq!(cli.hash_password.as_deref(), Some("s3cret"));
        assert!(cli.config.is_empty());
    }
}

use crate::config::Config;
use colored::*;
use env_logger::{Builder, Env};
use log::info;
use std::io::Write;

/// Initializes the logger with the `[timestamp] [level] message` format and
/// colored levels. `RUST_LOG` still takes precedence.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp().to_string();
            let level = match record.level() {
                log::Level::Error => record.level().to_string().red(),
                log::Level::Warn => record.level().to_string().yellow(),
                log::Level::Info => record.level().to_string().green(),
                log::Level::Debug => record.level().to_string().blue(),
                log::Level::Trace => record.level().to_string().white(),
            };
            writeln!(buf, "[{}] [{}] {}", timestamp, level, record.args())
        })
        .init();
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    let server = &config.server;
    info!("  Bind Address: {}:{}", server.bind_address, server.listen_port);
    info!("  PASV Port: {}", server.pasv_port);
    info!(
        "  PASV Address: {}",
        server.pasv_address.as_deref().unwrap_or("<control connection>")
    );
    info!("  Root Directory: {}", server.root_dir);
    info!(
        "  Write Cache: {} x {} bytes",
        server.max_cache, server.max_buffer
    );
    info!("  Transfer Chunk: {} bytes", server.transfer_chunk);
    info!("  Auth Timeout: {}s", server.auth_timeout_secs);
    info!("  Read Only: {}", server.read_only);
    info!("  Users: {}", config.users.len());
}

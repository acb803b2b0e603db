use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use pollftpd::core_auth::hash_password;
use pollftpd::core_cli::Cli;
use pollftpd::helpers::{init_logger, log_config};
use pollftpd::{server, Config, FtpServer, LocalFilesystem};
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "/etc/pollftpd.conf";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if let Some(password) = &args.hash_password {
        println!("{}", hash_password(password).context("Failed to hash password")?);
        return Ok(());
    }

    init_logger(args.verbose);

    let mut config = if !args.config.is_empty() {
        Config::load_from_file(Path::new(&args.config))?
    } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
        Config::load_from_file(Path::new(DEFAULT_CONFIG_PATH))?
    } else {
        info!("No configuration file, using defaults");
        Config::default()
    };
    args.apply(&mut config);
    log_config(&config);

    let session_config = config
        .session_config()
        .context("Invalid configuration")?;
    let fs = LocalFilesystem::new(&config.server.root_dir).with_context(|| {
        format!("Failed to open root directory: {}", config.server.root_dir)
    })?;
    let server = FtpServer::bind(session_config, fs).context("Failed to start FTP server")?;

    server::run(server, config.poll_interval(), args.once).await
}

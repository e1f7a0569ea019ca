//! R2 Uploadr - single-file uploader for Cloudflare R2
//!
//! `login` fetches and stores credentials, `upload` sends a file, `logout`
//! forgets the credentials and `serve` runs the credential endpoint.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use r2_uploadr::auth::AuthClient;
use r2_uploadr::config::Config;
use r2_uploadr::credentials::CredentialStore;
use r2_uploadr::server::CredentialServer;
use r2_uploadr::upload::{upload_file, LocalFile};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// R2 Uploadr - upload a file to Cloudflare R2, skipping unchanged content
#[derive(Parser, Debug)]
#[command(name = "r2-uploadr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange an API key for storage credentials and store them
    Login {
        #[arg(long)]
        api_key: String,
    },
    /// Remove stored credentials
    Logout,
    /// Upload a file using stored credentials
    Upload {
        file: PathBuf,
        /// MIME type to send instead of guessing from the extension
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Run the credential issuance server
    Serve,
}

fn init_logging(config: &Config, override_level: Option<&str>) -> anyhow::Result<()> {
    let level = override_level.unwrap_or(&config.logging.level).to_lowercase();
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.logging.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => Config::default(),
    };

    init_logging(&config, args.log_level.as_deref())?;
    info!("Starting R2 Uploadr v{}", r2_uploadr::VERSION);

    let store = CredentialStore::new(&config.store.dir);

    match args.command {
        Command::Login { api_key } => {
            let credentials = AuthClient::new(&config.auth)?.get_auth(&api_key).await?;
            store.login(&credentials)?;
            println!("Logged in to bucket {}", credentials.bucket_name);
        }
        Command::Logout => {
            store.logout()?;
            println!("Logged out");
        }
        Command::Upload { file, content_type } => {
            let Some(credentials) = store.load()? else {
                bail!("not logged in; run `r2-uploadr login --api-key <KEY>` first");
            };

            let mut source = LocalFile::new(file);
            if let Some(content_type) = content_type {
                source = source.with_content_type(content_type);
            }

            let result = upload_file(
                &source,
                &credentials,
                &config.storage,
                Some(Box::new(|progress| println!("Upload progress: {}%", progress))),
            )
            .await?;

            println!(
                "Uploaded {} bytes ({:.2} MB/s), ETag {}",
                result.bytes_written,
                result.throughput_mib_per_sec(),
                result.etag
            );
        }
        Command::Serve => {
            let Some(server_config) = config.server.clone() else {
                bail!("no `server` section in configuration");
            };
            CredentialServer::new(server_config)?.run().await?;
        }
    }

    Ok(())
}

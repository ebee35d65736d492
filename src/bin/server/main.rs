use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use portfolio_catalog::{
    adapters::outbound::storage::s3::S3Config,
    app::{AppBuilder, AppConfig, StorageBackend, DEFAULT_PUBLIC_BASE_URL},
    services::{DEFAULT_MAX_COMMIT_ATTEMPTS, DEFAULT_UPLOAD_URL_TTL},
};
use std::{net::SocketAddr, time::Duration};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Memory,
    S3,
}

#[derive(Parser, Debug)]
#[command(name = "portfolio-catalog-server")]
#[command(about = "Portfolio catalog served from an object store", long_about = None)]
struct Cli {
    /// Server port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value = "3000")]
    port: u16,

    /// Server host to bind to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Storage backend type
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value = "memory")]
    storage_backend: Backend,

    /// S3 endpoint URL, for S3-compatible services
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 bucket name
    #[arg(long, env = "S3_BUCKET")]
    s3_bucket: Option<String>,

    /// S3 region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    s3_region: String,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY")]
    s3_secret_key: Option<String>,

    /// Lifetime of direct-upload URLs in seconds
    #[arg(long, env = "UPLOAD_URL_TTL_SECS", default_value_t = DEFAULT_UPLOAD_URL_TTL.as_secs())]
    upload_url_ttl_secs: u64,

    /// Image worker threads (defaults to available cores)
    #[arg(long, env = "IMAGE_WORKERS")]
    image_workers: Option<usize>,

    /// Attempts per document commit before giving up on concurrent writers
    #[arg(long, env = "MAX_COMMIT_ATTEMPTS", default_value_t = DEFAULT_MAX_COMMIT_ATTEMPTS)]
    max_commit_attempts: usize,

    /// Public base URL used in locally signed upload URLs
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = DEFAULT_PUBLIC_BASE_URL)]
    public_base_url: String,

    /// Secret for locally signed upload URLs
    #[arg(long, env = "LOCAL_UPLOAD_SECRET")]
    local_upload_secret: Option<String>,

    /// Log level, used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        let storage_backend = match self.storage_backend {
            Backend::Memory => StorageBackend::InMemory,
            Backend::S3 => {
                let bucket = self
                    .s3_bucket
                    .clone()
                    .context("S3_BUCKET is required for S3 backend")?;

                StorageBackend::S3(S3Config {
                    bucket,
                    region: self.s3_region.clone(),
                    access_key: self.s3_access_key.clone(),
                    secret_key: self.s3_secret_key.clone(),
                    endpoint: self.s3_endpoint.clone(),
                })
            }
        };

        Ok(AppConfig {
            storage_backend,
            upload_url_ttl: Duration::from_secs(self.upload_url_ttl_secs),
            image_workers: self.image_workers,
            public_base_url: self.public_base_url.clone(),
            local_upload_secret: self.local_upload_secret.clone(),
            max_commit_attempts: self.max_commit_attempts,
        })
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .context("Invalid log level")?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    info!(backend = ?cli.storage_backend, "Starting portfolio catalog server");

    let config = cli.to_app_config()?;
    if cli.storage_backend == Backend::Memory {
        if config.local_upload_secret.is_none() {
            warn!("LOCAL_UPLOAD_SECRET not set; upload URLs will not survive a restart");
        }
        warn!("In-memory storage: all records and uploads are lost on shutdown");
    }

    let app_services = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    let router = app_services.router();

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("Invalid listen address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, router)
        .await
        .context("Failed to start server")?;

    Ok(())
}

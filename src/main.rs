//! Storage Explorer - browse a local directory or an S3 bucket over HTTP
//!
//! # Usage
//! ```bash
//! storage-explorer local /srv/data                  # Serve a directory
//! storage-explorer s3 --bucket my-bucket            # Serve a bucket
//! storage-explorer --port 8080 --max-entries-per-level 10000 local .
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storage_explorer::routes;
use storage_explorer::storage::{S3Client, S3Config, StorageExplorer};
use storage_explorer::ExplorerSettings;

/// Storage Explorer - list, download and walk files in local or object storage
#[derive(Parser)]
#[command(name = "storage-explorer")]
#[command(about = "Browse a directory or an S3 bucket through one HTTP API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    backend: BackendCommand,

    /// Port to run the server on
    #[arg(short, long, default_value = "3001", global = true)]
    port: u16,

    /// Timeout for each backend call, in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout_secs: u64,

    /// Maximum concurrent listing calls while building a tree
    #[arg(long, default_value = "8", global = true)]
    tree_concurrency: usize,

    /// Reject directory levels holding more entries than this
    #[arg(long, global = true)]
    max_entries_per_level: Option<usize>,
}

#[derive(Subcommand)]
enum BackendCommand {
    /// Serve a local directory
    Local {
        /// Root directory; nothing outside it is reachable
        #[arg(value_name = "ROOT", env = "LOCAL_STORAGE_PATH")]
        root: PathBuf,
    },
    /// Serve an S3 bucket (credentials from the AWS_* environment)
    S3 {
        #[arg(long, env = "AWS_S3_BUCKET_NAME")]
        bucket: String,

        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,

        /// Custom endpoint, e.g. a MinIO server
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "storage_explorer=info,tower_http=warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = ExplorerSettings::default()
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_tree_concurrency(cli.tree_concurrency)
        .with_max_entries_per_level(cli.max_entries_per_level);

    let (explorer, source) = match cli.backend {
        BackendCommand::Local { root } => {
            let explorer = match StorageExplorer::filesystem(&root, settings) {
                Ok(e) => e,
                Err(e) => {
                    eprintln!("✗ Failed to open storage root: {}", e);
                    eprintln!("  Path: {}", root.display());
                    std::process::exit(1);
                }
            };
            (explorer, root.display().to_string())
        }
        BackendCommand::S3 { bucket, region, endpoint } => {
            let config = S3Config {
                bucket: bucket.clone(),
                region,
                endpoint,
                timeout: settings.timeout,
            };
            let client = S3Client::from_env(&config)?;
            let explorer = StorageExplorer::object_store(Arc::new(client), bucket.clone(), settings);
            (explorer, format!("s3://{}", bucket))
        }
    };

    let shared = Arc::new(explorer);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(shared))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to port {}: {}", cli.port, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    tracing::info!("Storage Explorer serving {} on http://{}", source, addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
        tracing::info!("Shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

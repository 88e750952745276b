// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use certblob_kernel::Digest;
use certblob_node::config::{StorageArgs, StorageConfig};
use certblob_node::{open_storage, telemetry};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Certified blob store client", long_about = None)]
struct Cli {
    #[command(flatten)]
    storage: StorageArgs,

    /// Print Prometheus metrics to stderr before exiting
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a file and print its receipt
    Put {
        file: PathBuf,
        /// Seconds the blob should be kept for
        #[arg(long, default_value_t = 0)]
        keep_for: u64,
    },
    /// Fetch a blob by content hash and verify it
    Get {
        hash: String,
        /// Write the blob here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Store and read back a probe blob
    Health,
    /// Print the backend's expiration policy
    Policy,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry();

    let config = StorageConfig::from(cli.storage);
    tracing::info!("Initializing storage client with config: {:?}", config);
    let storage = open_storage(&config).await.context("failed to open storage")?;

    match cli.command {
        Command::Put { file, keep_for } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let expiry = if keep_for == 0 {
                0
            } else {
                SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() + keep_for
            };
            let receipt = storage.put(&data, expiry).await?;
            println!(
                "{}",
                serde_json::json!({
                    "leaf_hash": receipt.leaf_hash.to_hex(),
                    "root_hash": receipt.root_hash.to_hex(),
                })
            );
        }
        Command::Get { hash, out } => {
            let hash = Digest::from_hex(&hash)?;
            let data = storage.get_by_hash(&hash).await?;
            match out {
                Some(path) => tokio::fs::write(&path, &data)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&data)?;
                }
            }
        }
        Command::Health => {
            storage.health_check().await?;
            println!("ok");
        }
        Command::Policy => {
            println!("{}", storage.expiration_policy().await?);
        }
    }

    storage.close().await?;
    if cli.metrics {
        eprintln!("{}", telemetry::get_metrics());
    }
    Ok(())
}

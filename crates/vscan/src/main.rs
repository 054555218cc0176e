//! vscan
//!
//! Scans a vCenter inventory, resolves tag attachments and uploads a JSON
//! report to blob storage.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vscan_client::{BlobPublisher, BlobTarget, RestInventoryClient, RestTagClient};
use vscan_core::{Orchestrator, OrchestratorArgs, RunError, ScannerConfig};

mod config;

#[derive(Parser)]
#[command(name = "vscan")]
#[command(about = "vCenter inventory and tag scanner", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "VSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// vCenter URL, overrides the configuration file
    #[arg(long)]
    url: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Log level filter when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let path = config::locate(cli.config.as_deref()).wrap_err("unable to load configuration")?;
    let config = config::load(&path)
        .and_then(|config| {
            config::apply(
                config,
                config::Overrides {
                    url: cli.url,
                    insecure: cli.insecure,
                    log_level: cli.log_level,
                },
            )
        })
        .wrap_err("unable to load configuration")?;

    init_tracing(&config.log_level, cli.log_json);
    debug!(path = %path.display(), "using configuration file");

    execute(&config).await
}

/// Wire the clients together and run one scan
async fn execute(config: &ScannerConfig) -> Result<()> {
    let credentials = config.credentials();

    let inventory = RestInventoryClient::connect(
        &config.vmware_api_url,
        &credentials,
        config.vmware_api_insecure,
    )
    .await
    .map_err(RunError::Connection)
    .wrap_err("unable to create inventory scanner")?;
    let inventory = Arc::new(inventory);

    let tag_client = Arc::new(
        RestTagClient::new(&config.vmware_api_url, config.vmware_api_insecure)
            .map_err(RunError::Connection)
            .wrap_err("unable to create tag client")?,
    );

    let target = BlobTarget::azure(
        &config.klarity_storage_name,
        &config.blob_host,
        vec![
            config.klarity_customer_id.clone(),
            config.klarity_installation_id.clone(),
        ],
        config.klarity_sas_token.clone(),
    )
    .map_err(RunError::from)
    .wrap_err("invalid storage target")?;

    let orchestrator = Orchestrator::new(OrchestratorArgs {
        inventory: inventory.clone(),
        tag_client: tag_client.clone(),
        credentials,
        publisher: Arc::new(BlobPublisher::new(target)),
        object_types: config.scanned_objects.clone(),
    });

    let result = orchestrator.run().await;

    tag_client.logout().await;
    inventory.logout().await;

    result.wrap_err("unable to publish report")?;

    Ok(())
}

use clap::{Parser, Subcommand};
use fed_control::config::Config;
use fed_control::storage::StorageBackends;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fedctl", about = "Federated server control plane")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Storage backend lifecycle
    Storage {
        #[command(subcommand)]
        action: StorageAction,
    },
}

#[derive(Debug, Subcommand)]
enum StorageAction {
    /// Create the layout of the configured backend
    Bootstrap,
    /// Remove the configured backend's data
    Clean,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fed_control=info,fed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    let backend = config.backend_config();
    let backends = StorageBackends::linked();

    info!(
        kind = %backend.kind,
        path = %backend.path.display(),
        linked = ?backends.kinds(),
        "Configuration loaded"
    );

    match cli.command {
        Command::Storage { action } => {
            let result = match action {
                StorageAction::Bootstrap => backends.bootstrap(&backend).await,
                StorageAction::Clean => backends.clean(&backend).await,
            };
            result.map_err(|e| {
                error!("Storage {:?} failed: {}", action, e);
                e
            })?;
        }
    }

    Ok(())
}

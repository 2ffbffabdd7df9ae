use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evomart::config::{GeneratorConfig, StoreConfig};
use evomart::engine::StoreEngine;
use evomart::generator::Generator;
use evomart::storage::JsonFileStore;
use evomart::{api, mcp};

#[derive(Parser)]
#[command(name = "evomart")]
#[command(about = "An evolving product store where products compete for favorites")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for the HTTP API
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Start MCP server via stdio (for agent integration)
    Mcp,
}

/// Initialize tracing with output to stderr (for MCP mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "evomart=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // MCP mode: log to stderr so stdout is clean for protocol
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_engine() -> anyhow::Result<Arc<StoreEngine>> {
    let config = StoreConfig::from_env()?;
    let generator_config = GeneratorConfig::from_env()?;

    let store = match &config.state_path {
        Some(path) => JsonFileStore::open(path.clone())?,
        None => JsonFileStore::open_default()?,
    };
    tracing::info!("state file at {}", store.path().display());

    let generator = Generator::from_config(&generator_config);
    let timeout = generator_config.timeout;

    Ok(Arc::new(StoreEngine::new(
        Arc::new(store),
        generator,
        config,
        timeout,
    )))
}

async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting evomart server on {}:{}", host, port);

    let engine = build_engine()?;
    let app = api::create_router(engine);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("evomart listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // MCP mode needs stderr for logging since stdout is the protocol channel
    let use_stderr = matches!(cli.command, Some(Commands::Mcp));
    init_tracing(use_stderr);

    match cli.command {
        Some(Commands::Serve { port, host }) => {
            serve(&host, port).await?;
        }
        Some(Commands::Mcp) => {
            let engine = build_engine()?;
            mcp::run_stdio_server(engine).await?;
        }
        None => {
            // Default: start the HTTP server
            serve("127.0.0.1", 8000).await?;
        }
    }

    Ok(())
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use aiconsole_agents::{CompletionClient, ToolServices};
use aiconsole_config::{AppConfig, ConfigLoader};
use aiconsole_db::ConversationStore;
use aiconsole_gateway::GatewayServer;
use aiconsole_gateway::state::AppState;
use aiconsole_security::RedactingWriter;

#[derive(Parser)]
#[command(name = "aiconsole", version, about = "Conversational AI console service")]
struct Cli {
    /// Path to the config file. Defaults to ~/.aiconsole/config.toml.
    #[arg(long, env = "AICONSOLE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the console gateway.
    Serve {
        /// Bind host override.
        #[arg(long)]
        host: Option<String>,

        /// Bind port override.
        #[arg(long)]
        port: Option<u16>,
    },
    /// List the models available behind the configured completion endpoint.
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(RedactingWriter::stderr())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(ConfigLoader::default_config_path);
    let config = ConfigLoader::load(&config_path).context("failed to load configuration")?;

    match cli.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Models => models(config).await,
    }
}

async fn serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let db_path = config
        .database
        .path
        .clone()
        .unwrap_or_else(ConfigLoader::default_database_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    info!("conversation log at {}", db_path.display());
    let store = ConversationStore::open(&db_path).context("failed to open conversation log")?;

    let state = AppState::new(config, store, ToolServices::default())
        .context("failed to build application state")?;
    GatewayServer::new(Arc::new(state))
        .run()
        .await
        .context("gateway exited with an error")
}

async fn models(config: AppConfig) -> anyhow::Result<()> {
    let client = CompletionClient::new(
        config.llm.api_key.unwrap_or_default(),
        config.llm.base_url,
    );
    for model in client.list_models().await.context("failed to list models")? {
        println!("{model}");
    }
    Ok(())
}

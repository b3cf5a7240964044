use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ed25519_dalek::VerifyingKey;

use topicboard_core::tracing_setup::init_tracing;
use topicboard_core::{SqliteStore, TopicSync};

use topicboard_gateway::commands::Commands;
use topicboard_gateway::config::GatewayConfig;
use topicboard_gateway::discord::DiscordClient;
use topicboard_gateway::interactions::{self, AppState};
use topicboard_gateway::{migrate, register};

#[derive(Parser)]
#[command(name = "topicboard-gateway", about = "Topics board bot gateway")]
struct Cli {
    /// Path to a JSON config file; environment variables fill the gaps.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactions webhook (the default).
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
    },
    /// Upload the slash-command definitions.
    RegisterCommands {
        /// Restrict registration to one guild instead of registering globally.
        #[arg(long)]
        guild: Option<u64>,
    },
    /// Import legacy flat-file data into the store.
    Migrate {
        #[arg(long, default_value = "guilds.json")]
        guilds_file: PathBuf,
        #[arg(long, default_value = "topics")]
        topics_dir: PathBuf,
    },
}

fn parse_public_key(hex_key: &str) -> Result<VerifyingKey> {
    let bytes = hex::decode(hex_key).context("public key is not valid hex")?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .context("public key must be 32 bytes")?;
    VerifyingKey::from_bytes(&bytes).context("public key is not a valid ed25519 key")
}

async fn serve(config: &GatewayConfig, bind: &str) -> Result<()> {
    let token = config.require_token()?;
    let verify_key = parse_public_key(config.require_public_key()?)?;

    let db_path = config.db_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;
    let sync = Arc::new(TopicSync::new(Arc::new(store)));
    let chat = Arc::new(DiscordClient::new(token));
    let commands = Commands::new(sync, chat);

    let state = Arc::new(AppState {
        commands,
        verify_key,
    });
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(%bind, db = %db_path.display(), "interactions webhook listening");
    axum::serve(listener, interactions::router(state))
        .await
        .context("webhook server failed")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = GatewayConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve {
        bind: "0.0.0.0:8080".to_string(),
    }) {
        Command::Serve { bind } => serve(&config, &bind).await,
        Command::RegisterCommands { guild } => {
            register::register_commands(config.require_token()?, config.require_app_id()?, guild)
                .await
        }
        Command::Migrate {
            guilds_file,
            topics_dir,
        } => {
            let db_path = config.db_path();
            let store = SqliteStore::open(&db_path)
                .with_context(|| format!("failed to open store at {}", db_path.display()))?;
            migrate::run_migration(&store, &guilds_file, &topics_dir).await?;
            Ok(())
        }
    }
}

use clap::Parser;
use deadswitch::db::{self, services::api_key_service};
use deadswitch::server::config::ServerConfig;
use deadswitch::services::auth_service;
use tracing_subscriber::EnvFilter;

/// Creates an API key for heartbeat clients and prints it once.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Human-readable name for the key
    #[arg(short, long)]
    name: String,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let name = args.name.trim();
    if name.is_empty() {
        return Err("--name must not be empty".into());
    }

    let config = ServerConfig::load(args.config.as_deref())?;
    let db_pool = db::connect(&config.database_url).await?;
    db::migrate(&db_pool).await?;

    let generated = auth_service::generate_api_key();
    let api_key = api_key_service::create_api_key(
        &db_pool,
        name,
        &generated.key_hash,
        &generated.key_prefix,
    )
    .await?;

    println!("API key '{}' created (id {}).", api_key.name, api_key.id);
    println!("Key: {}", generated.plaintext);
    println!("Store this key securely. It will not be shown again.");
    Ok(())
}

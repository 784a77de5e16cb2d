use clap::Parser;
use deadswitch::alerting::{EvaluationService, Scheduler, SystemClock};
use deadswitch::db::{self, services::DbAlertStore};
use deadswitch::notifications::{senders::telegram::TelegramSender, NotificationService};
use deadswitch::server::config::ServerConfig;
use deadswitch::web::{create_axum_router, AppState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) {
    // JSON to a daily rotated file, human-readable to stdout.
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Shutdown signal received.");
    let _ = shutdown_tx.send(true);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load server configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&server_config.log_dir);
    info!("Starting server, version: {}", env!("CARGO_PKG_VERSION"));

    let db_pool = match db::connect(&server_config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to connect to database.");
            return Err(e.into());
        }
    };
    db::migrate(&db_pool).await?;

    let sender = TelegramSender::new(
        server_config.telegram_bot_token.clone(),
        &server_config.telegram_api_base,
        Duration::from_secs(server_config.notifier_timeout_secs),
    )?;
    let notification_service = NotificationService::new(Box::new(sender));
    if !notification_service.is_configured() {
        warn!("TELEGRAM_BOT_TOKEN is not set. Notifications will be recorded as failed.");
    }
    let notifier = Arc::new(notification_service);

    let store = Arc::new(DbAlertStore::new(db_pool.clone()));
    let evaluation_service = Arc::new(EvaluationService::new(store, notifier.clone()));
    let scheduler = Scheduler::new(
        evaluation_service,
        Arc::new(SystemClock),
        Duration::from_secs(server_config.evaluation_interval_secs),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx.clone()));
    tokio::spawn(shutdown_signal(shutdown_tx));

    let app_state = Arc::new(AppState {
        db_pool,
        notifier,
        config: server_config.clone(),
    });
    let app = create_axum_router(app_state);

    let listener = tokio::net::TcpListener::bind(server_config.listen_addr.as_str()).await?;
    info!(listen_addr = %server_config.listen_addr, "HTTP server listening.");

    let mut server_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server error.");
            e
        })?;
    if let Err(e) = scheduler_handle.await {
        error!(error = %e, "Scheduler task panicked.");
    }
    info!("Server stopped.");
    Ok(())
}

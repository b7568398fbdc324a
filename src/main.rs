//! hr-ask - ask a SQLite database questions in plain English.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use hr_ask::cli::Cli;
use hr_ask::config::AppConfig;
use hr_ask::db::SqliteDatabase;
use hr_ask::ingest::Ingestor;
use hr_ask::llm::{create_client, LlmSqlGenerator};
use hr_ask::logging::init_stderr_logging;
use hr_ask::pipeline::Assistant;
use hr_ask::server::{self, AppState};

#[tokio::main]
async fn main() {
    // A missing .env is fine; the environment may already carry the key.
    let dotenv = dotenvy::dotenv();
    init_stderr_logging();
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    if let Err(e) = run().await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = AppConfig::load_from_file(&config_path)?;
    cli.apply_to(&mut config);

    let client = create_client(&config.llm)?;
    let db = SqliteDatabase::new(&config.storage.database).with_max_rows(config.query.max_rows);
    info!("Database: {}", db.path().display());
    if config.query.read_only {
        info!("Read-only mode: generated SQL that writes will not run");
    }

    let assistant = Assistant::new(db.clone(), Box::new(LlmSqlGenerator::new(client)))
        .read_only(config.query.read_only);
    let ingestor = Ingestor::new(db, &config.storage.uploads_dir)
        .with_preview_rows(config.query.max_rows);

    let app = server::router(
        AppState::new(assistant, ingestor),
        config.server.upload_limit_bytes(),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    server::serve(listener, app, shutdown_signal()).await?;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notes_api::config::Config;
use notes_api::db::Database;
use notes_api::{api, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notes_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Configuration loaded successfully");

    let db = Database::connect(&config).await?;
    tracing::info!("Database connection pool initialized");

    db.run_migrations().await?;
    tracing::info!("Database migrations applied");

    let sweep_interval = config.sweep.interval_secs;
    let state = AppState::new(config.clone(), db.clone());

    jobs::token_sweeper::spawn(db.pool.clone(), sweep_interval);

    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

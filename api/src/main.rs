use anyhow::Result;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;

use api::config::AppConfig;
use api::observability::Observability;
use api::routes;
use api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = AppConfig::from_env()?;
    let obs = Observability::init(config.log_format)?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        db_max_connections = config.db_max_connections,
        max_body_bytes = config.max_body_bytes,
        "Configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Database connected");

    let addr = config.bind_addr;
    let state = AppState::new(pool, obs.registry, config);
    let app = routes::build_router(state);

    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

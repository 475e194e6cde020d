use anyhow::Context;
use crud_admin::{
    app,
    config::{session::validate_production_config, AppConfig},
    db, AppState,
};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "crud_admin=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    validate_production_config(&config)?;

    // Database connection (migrations run on open)
    let pool = db::create_pool(&config.database_url)
        .await
        .with_context(|| format!("opening database {}", config.database_url))?;

    let state = AppState::new(pool, &config);
    let app = app::build_app(state, &config).await?;

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!(
        "Server running on http://{} ({} environment, listing cache {}s)",
        addr,
        config.environment,
        config.listing_cache_ttl.as_secs()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

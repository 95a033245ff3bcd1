use std::sync::Arc;

use dotenv::dotenv;
use mimalloc::MiMalloc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use newsroom::{
    App,
    config::ServerConfig,
    store::{
        Store,
        memory::{MemoryStore, seed_demo_data},
        postgres::PgStore,
    },
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn init_tracing() {
    let json = matches!(
        std::env::var("ENVIRONMENT").as_deref(),
        Ok("staging" | "production")
    );

    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "newsroom=debug,tower_http=debug".into()),
    );

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = ServerConfig::new_from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            tracing::info!(
                max_connections = config.database_max_connections,
                "Using the PostgreSQL store"
            );
            Arc::new(PgStore::connect(url, config.database_max_connections)?)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, using the in-memory store");
            let store = MemoryStore::new();
            if config.seed_demo_data {
                seed_demo_data(&store).await?;
            }
            Arc::new(store)
        }
    };

    let addr = config.bind_addr;
    let app = newsroom::router(App::new(store, config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

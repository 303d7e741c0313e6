use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use placement_backend::{
    config::{get_config, init_config, log_format_from_env, LogFormat},
    database::{
        memory::MemoryDirectoryStore,
        pool::{create_pool, run_migrations},
        postgres::PgDirectoryStore,
        seed::seed_demo_users,
        store::DirectoryStore,
    },
    middleware::cors::cors_layer,
    routes, AppState,
};
use tokio::net::TcpListener;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("placement_backend=info,tower_http=info"));
    match log_format_from_env() {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config()?;

    let store: Arc<dyn DirectoryStore> = if config.uses_memory_store() {
        tracing::warn!("using the in-memory store; data is lost on restart");
        Arc::new(MemoryDirectoryStore::new())
    } else {
        let pool = create_pool(config).await?;
        run_migrations(&pool).await?;
        Arc::new(PgDirectoryStore::new(pool))
    };

    if config.seed_demo_users {
        let seeded = seed_demo_users(store.as_ref()).await?;
        info!(seeded, "demo accounts checked");
    }

    let app_state = AppState::new(store, config.engine_settings(), &config.jwt_secret);

    let app = routes::router(app_state)
        .layer(cors_layer(config.cors_permissive))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use homestay::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    session::{PgSessionStore, SessionState},
    storage::{LocalDiskStorage, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Asynchronous entry point: initializes configuration, logging, the
/// database pool and migrations, the session store, local image storage,
/// and finally the HTTP server.
#[tokio::main]
async fn main() {
    // Configuration and environment loading (fail-fast on required keys).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // Log filter: RUST_LOG wins, with sensible local defaults otherwise.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "homestay=debug,tower_http=info,axum=trace".into());

    // Log format follows the environment: pretty for humans locally, JSON
    // for aggregators in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // Database pool and schema migrations.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Database migrations failed.");

    let repo = Arc::new(PostgresRepository::new(pool.clone())) as RepositoryState;

    // Sessions live in the same database; tokens are digested with the
    // configured secret before storage.
    let sessions =
        Arc::new(PgSessionStore::new(pool, &config.session_secret)) as SessionState;

    // Profile images go to local disk, served back under /uploads.
    let storage = Arc::new(LocalDiskStorage::new(&config.upload_dir)) as StorageState;

    let port = config.port;
    let app_state = AppState {
        repo,
        sessions,
        storage,
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("FATAL: Failed to bind listener.");

    tracing::info!("Listening on 0.0.0.0:{port}");

    axum::serve(listener, app)
        .await
        .expect("FATAL: Server error.");
}

mod auth;
mod config;
mod http;
mod pow;
mod scheduler;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adapter::{build_platforms, ImportJob};
use auth::UserTokens;
use config::Settings;
use http::router::{build_router, RouterOptions};
use pow::PowGuard;
use service::{
    CatalogLookup, FileUploader, ListingComposer, LocalFileStore, RatingAggregator, ReviewCreator,
};
use state::AppState;
use storage::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url).await?;

    let store = Arc::new(LocalFileStore::new(
        db.clone(),
        &settings.uploads.dir,
        &settings.uploads.public_prefix,
    ));
    let uploader = FileUploader::new(store, &settings.uploads.namespace);
    let catalog = CatalogLookup::new(db.clone(), settings.collections.catalog_id);
    if !catalog.is_configured() {
        info!("catalog collection not configured, product lookups disabled");
    }

    let listing = ListingComposer::new(
        db.clone(),
        catalog,
        settings.locale,
        &settings.uploads.public_prefix,
    );
    let ratings = RatingAggregator::new(db.clone(), settings.locale);
    let creator = ReviewCreator::new(
        db.clone(),
        uploader,
        settings.collections.clone(),
        settings.locale,
    );

    let platforms =
        build_platforms(&settings.import.platforms).context("Failed to set up review platforms")?;
    info!(count = platforms.len(), "review platforms configured");
    let import = ImportJob::new(db.clone(), creator.clone(), platforms);

    let shutdown = CancellationToken::new();
    if settings.import.enabled {
        let every = Duration::from_secs(settings.import.interval_secs.max(60));
        tokio::spawn(scheduler::run_imports(
            import.clone(),
            every,
            settings.import.run_on_startup,
            shutdown.clone(),
        ));
    }

    let state = AppState {
        db,
        listing,
        ratings,
        creator,
        import,
        pow: PowGuard::new(settings.security.pow_difficulty),
        tokens: UserTokens::new(&settings.security.auth_secret),
        admin_token: settings.security.admin_token.clone(),
    };

    let app = build_router(
        state,
        RouterOptions {
            allowed_origins: &settings.server.cors_origins,
            upload_dir: &settings.uploads.dir,
            public_prefix: &settings.uploads.public_prefix,
            max_body_bytes: settings.uploads.max_body_mb * 1024 * 1024,
        },
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
    shutdown.cancel();
}

use std::sync::Arc;

use anyhow::Context;
use diary_api::auth::TokenIssuer;
use diary_api::store::PgStore;
use diary_api::{db, mail, router, AppState, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().context("Failed to load settings")?;

    let pool = db::connect(&settings.database)
        .await
        .context("Failed to connect to database")?;
    db::ensure_schema(&pool)
        .await
        .context("Failed to prepare database schema")?;

    let mailer: Arc<dyn mail::Mailer> =
        mail::from_settings(&settings.mail).context("Failed to configure mailer")?;

    let state = AppState::new(
        PgStore::new(pool),
        mailer,
        TokenIssuer::new(&settings.auth.jwt_secret),
    )
    .with_require_verification(settings.auth.require_verification);

    let addr = settings.server.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

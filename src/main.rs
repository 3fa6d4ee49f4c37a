use anyhow::Context;
use tracing_subscriber::EnvFilter;

use orgkeep_api::{
    bootstrap, build_router,
    config::AppConfig,
    database::Store,
    security::Codec,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, ORGKEEP_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting OrgKeep API in {:?} mode", config.environment);

    let keys = config.keys().context("loading key material")?;
    let store = Store::connect(&config.database).await.context("connecting store")?;
    store.create_schema().await.context("applying schema")?;

    let codec = Codec::new(keys.key.clone(), config.security.argon2);
    let root = bootstrap::ensure_root(&store, &codec, &config.root)
        .await
        .context("bootstrapping root identity")?;
    if let Some(secret) = &root.api_secret {
        // Shown once so an operator can obtain a root token.
        println!("Root org:        {}", root.org);
        println!("Root user:       {}", root.user);
        println!("Root api secret: {}", secret);
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store.clone(), keys, root.ids());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    println!("OrgKeep API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server")?;

    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

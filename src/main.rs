use sea_orm::{ConnectOptions, Database};
use std::{net::SocketAddr, process, sync::Arc};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shop_api::{
    app,
    config::Config,
    entities::{seed_admin, setup_schema},
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            process::exit(1);
        }
    };

    if let Err(err) = run(config).await {
        error!(error = %err, "Server stopped with an error");
        process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;

    setup_schema(&db).await?;
    if let Some(seed) = &config.admin {
        seed_admin(&db, seed).await?;
    }

    let db = Arc::new(db);
    let router = app(db.clone(), &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, closing database pool");
    match Arc::try_unwrap(db) {
        Ok(db) => db.close().await?,
        Err(_) => info!("Database pool still shared, dropping it"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => error!(error = %err, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

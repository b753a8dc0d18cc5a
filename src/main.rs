use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use fleet_seeder as seeder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = seeder::config::load_config().context("loading configuration")?;
    seeder::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db_pool = seeder::db::establish_connection_from_app_config(&cfg)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    // Make sure the schema is usable before accepting traffic
    let report = seeder::migrator::provision_schema(&db_pool).await?;
    info!(
        tables_created = report.tables_created.len(),
        columns_added = report.columns_added.len(),
        "Schema ready"
    );

    let host = cfg.host.clone();
    let port = cfg.port;
    let app = seeder::app_router(seeder::AppState::new(db_pool, cfg));

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    info!("fleet-seeder listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

use anyhow::{Context, Result};

use hubstats::config::Config;
use hubstats::engine::Session;
use hubstats::server::DashboardServer;

/// Open a session and serve its aggregates until Ctrl-C
pub async fn serve(config: Config) -> Result<()> {
    let session = Session::open(&config)
        .await
        .context("Failed to open analytics session")?;

    let server = DashboardServer::from_session(config.server.clone(), &session)
        .await
        .context("Failed to initialize dashboard server")?;

    println!("{}", server.info().display());
    println!();
    println!("Endpoints:");
    println!("  GET /health");
    println!("  GET /api/dashboard");
    println!("  GET /api/trends");
    println!("  GET /api/licenses/models?top=N");
    println!("  GET /api/licenses/datasets?top=N");
    println!("  GET /api/sdks?top=N");
    println!("  GET /api/growth?base=<id>");
    println!();

    server
        .start_with_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    session.close();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

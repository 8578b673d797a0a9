use dwa_demo::{config, routes, sim, state};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::ServerConfig::from_env()?;
    let port = config.port;
    tracing::info!(
        port,
        tick_ms = config.tick.as_millis(),
        frame_buffer = config.frame_buffer,
        jpeg_quality = config.jpeg_quality,
        footprint_style = ?config.footprint_style,
        "config loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = state::AppState::new(config, shutdown_rx.clone());

    let sim_loop = sim::spawn_sim_loop(state.clone(), shutdown_rx);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "dwa demo listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutdown signal received");
            shutdown_tx.send_replace(true);
        })
        .await?;

    sim_loop.await?;
    tracing::info!("server stopped");
    Ok(())
}

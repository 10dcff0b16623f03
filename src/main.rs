use anyhow::{Context, Result};
use clap::Parser;
use teams_audio_tab::{app, create_router, AppState, Config, LogLevel};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "teams-audio-tab", version, about = "Audio capture tab host")]
struct Args {
    /// Config file path (extension optional)
    #[arg(long, default_value = "config/teams-tab")]
    config: String,

    /// Override service.http.bind
    #[arg(long)]
    bind: Option<String>,

    /// Override service.http.port
    #[arg(long)]
    port: Option<u16>,

    /// Override logging.level (debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("teams_audio_tab=info,tower_http=info,warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut cfg = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }
    if let Some(level) = args.log_level {
        cfg.logging.level = level.parse::<LogLevel>()?;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Widget log level: {}", cfg.logging.level);
    if cfg.show_function() {
        info!("Function panel: {}", cfg.function.api_endpoint);
    } else {
        info!("No function configured; function panel disabled");
    }

    let tab = app::build_tab(&cfg).await?;
    let state = AppState::new(tab);
    let router = create_router(state.clone());

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Tab host listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // Release the microphone if a recording was still running
    let released = state.tab.lock().await.close_capture();
    if released > 0 {
        warn!("Released {} device track(s) on shutdown", released);
    }

    info!("Tab host stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

// Scorebook server entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config (copying defaults on first run)
// 3. Open database, pin policy version, run legacy import if configured
// 4. Build shared state and router
// 5. Serve until Ctrl+C

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use scorebook_app::{app, config, web};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Scorebook starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: team={}, policy={}",
        config.team.name, config.policy.version
    );

    // 3. Open database and prepare the store
    let base_dir = std::env::current_dir().context("failed to read working directory")?;
    let db = app::prepare_store(&config, &base_dir)?;

    // 4. Build shared state and router
    let state = Arc::new(app::build_state(&config, db));
    let router = web::create_router(state);

    // 5. Serve
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Scorebook shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
    }
}

/// Initialize tracing to stdout, filtered by `RUST_LOG`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("scorebook_app=info,scorebook_core=info,warn")
            }),
        )
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

//! Vigil host — bootstrap entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Init logger at default level
//!   3. Load config
//!   4. Re-init logger at configured level
//!   5. Bootstrap the application root (graph, observer, crash, monitor)
//!   6. Run until SIGINT/SIGTERM, then shut down

use tracing::info;

use vigil_host::{app::App, config, error::AppError, logger};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    // Bootstrap logger at "info" before config is available.
    logger::init("info")?;

    let config = config::load()?;

    info!(
        app_name = %config.app_name,
        work_dir = %config.work_dir.display(),
        log_level = %config.log_level,
        "config loaded"
    );

    // Re-init at the configured level now that we know it.
    logger::init(&config.log_level)?;

    let app = App::bootstrap(config).await?;
    println!("✓ Host initialized: app={}", app.config().app_name);

    wait_for_shutdown().await;
    app.shutdown().await;
    Ok(())
}

/// Block until SIGINT (ctrl-c) or SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(%e, "cannot install SIGTERM handler, using ctrl-c only");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("SIGINT received"),
            _ = sigterm.recv() => info!("SIGTERM received"),
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("ctrl-c received");
    }
}

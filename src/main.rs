use std::sync::Arc;

use portico::config::Config;
use portico::http::mime::MimeTable;
use portico::server::{self, ServerContext};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_file(path)?,
        None => Config::load()?,
    };

    let mime = match MimeTable::load(&cfg.static_files.mime_types) {
        Ok(table) => {
            tracing::info!(types = table.len(), "mime types loaded");
            table
        }
        Err(e) => {
            tracing::warn!(
                path = %cfg.static_files.mime_types.display(),
                error = %e,
                "mime types not loaded, files will be sent without Content-Type"
            );
            MimeTable::default()
        }
    };

    let ctx = Arc::new(ServerContext::new(cfg, mime));
    let (stop_tx, stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                let _ = stop_tx.send(true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for ctrl-c");
                // keep the sender alive so the listener keeps running
                std::future::pending::<()>().await;
            }
        }
    });

    let drain = server::listener::run(ctx, stop_rx).await?;
    tracing::info!(?drain, "server stopped");

    Ok(())
}

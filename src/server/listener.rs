use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket, lookup_host};
use tokio::sync::watch;
use tracing::{error, info, trace, warn};

use crate::config::ServerConfig;
use crate::http::connection::Connection;
use crate::server::ServerContext;
use crate::server::pool::{Drain, Job, WorkerPool};

/// Binds the configured address and serves until `shutdown` turns true (or
/// its sender goes away). Bind failures are returned before anything is
/// accepted.
pub async fn run(ctx: Arc<ServerContext>, shutdown: watch::Receiver<bool>) -> anyhow::Result<Drain> {
    let listener = bind(&ctx.config.server).await?;
    Ok(serve(listener, ctx, shutdown).await)
}

/// Binds `hostname:port` (all interfaces without a hostname) with the
/// configured backlog.
pub async fn bind(cfg: &ServerConfig) -> anyhow::Result<TcpListener> {
    let host = cfg.hostname.as_deref().unwrap_or("0.0.0.0");
    let addr: SocketAddr = lookup_host((host, cfg.port))
        .await
        .with_context(|| format!("cannot resolve {}", host))?
        .next()
        .with_context(|| format!("no address for {}", host))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .context("server socket could not be created")?;

    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("cannot bind {}", addr))?;
    let listener = socket.listen(cfg.backlog)?;

    info!("Listening on {}", addr);
    Ok(listener)
}

/// Accept loop. Each connection is handed to the worker pool; on shutdown
/// the listener is closed first and the pool drained after.
pub async fn serve(
    listener: TcpListener,
    ctx: Arc<ServerContext>,
    mut shutdown: watch::Receiver<bool>,
) -> Drain {
    let cfg = &ctx.config.server;
    let pool = WorkerPool::new(cfg.pool_size, cfg.queue_size, cfg.shutdown_grace());
    let poll = cfg.accept_poll();

    loop {
        let stopping = *shutdown.borrow();
        if stopping {
            break;
        }

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }

            accepted = tokio::time::timeout(poll, listener.accept()) => match accepted {
                Err(_) => trace!("server is idle .. no incoming request"),
                Ok(Err(e)) => warn!(error = %e, "accept error"),
                Ok(Ok((socket, peer))) => {
                    trace!("Accepted connection from {}", peer);

                    if let Err(e) = socket.set_nodelay(true) {
                        error!(peer = %peer, error = %e, "connection setup failed, closing");
                        drop(socket);
                    } else {
                        let conn = Connection::new(socket, peer, Arc::clone(&ctx));
                        if submit_or_stop(&pool, Box::pin(conn.run()), &mut shutdown).await {
                            info!(peer = %peer, "stop requested while the queue was full, dropping connection");
                            break;
                        }
                    }
                }
            }
        }
    }

    drop(listener);
    info!("listener stopped, draining connections");
    let drain = pool.shutdown().await;
    info!(?drain, "exiting listener");
    drain
}

/// Queues a connection, waiting for room in the queue unless a stop is
/// requested first. Returns true on stop; the job is then dropped.
async fn submit_or_stop(
    pool: &WorkerPool,
    job: Job,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let submit = pool.submit(job);
    tokio::pin!(submit);

    loop {
        tokio::select! {
            submitted = &mut submit => {
                if submitted.is_err() {
                    error!("worker pool closed, dropping connection");
                }
                return false;
            }

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return true;
                }
            }
        }
    }
}

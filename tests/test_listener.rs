use std::sync::Arc;

use portico::config::Config;
use portico::http::mime::MimeTable;
use portico::server::ServerContext;
use portico::server::listener::{bind, serve};
use portico::server::pool::Drain;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

fn config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.server.hostname = Some("127.0.0.1".to_string());
    config.server.port = 0;
    config.server.pool_size = 2;
    config.server.queue_size = 4;
    config.server.accept_poll_ms = 50;
    config.server.connection_timeout_ms = 2_000;
    config.server.shutdown_grace_secs = 5;
    config.static_files.root = root.to_path_buf();
    config
}

#[tokio::test]
async fn test_serves_over_tcp_and_stops_on_signal() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("hello.txt"), b"over tcp").unwrap();

    let cfg = config(tmp.path());
    let listener = bind(&cfg.server).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let ctx = Arc::new(ServerContext::new(cfg, MimeTable::parse("text/plain txt")));
    let (stop_tx, stop_rx) = watch::channel(false);
    let server = tokio::spawn(serve(listener, ctx, stop_rx));

    for _ in 0..3 {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8(raw).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.ends_with("\r\n\r\nover tcp"));
    }

    stop_tx.send(true).unwrap();
    assert_eq!(server.await.unwrap(), Drain::Graceful);
}

#[tokio::test]
async fn test_dropped_sender_stops_the_listener() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path());
    let listener = bind(&cfg.server).await.unwrap();

    let ctx = Arc::new(ServerContext::new(cfg, MimeTable::default()));
    let (stop_tx, stop_rx) = watch::channel(false);
    let server = tokio::spawn(serve(listener, ctx, stop_rx));

    drop(stop_tx);
    assert_eq!(server.await.unwrap(), Drain::Graceful);
}

#[tokio::test]
async fn test_stop_is_seen_while_the_queue_is_full() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = config(tmp.path());
    cfg.server.pool_size = 1;
    cfg.server.queue_size = 1;
    cfg.server.connection_timeout_ms = 30_000;
    cfg.server.shutdown_grace_secs = 0;

    let listener = bind(&cfg.server).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let ctx = Arc::new(ServerContext::new(cfg, MimeTable::default()));
    let (stop_tx, stop_rx) = watch::channel(false);
    let server = tokio::spawn(serve(listener, ctx, stop_rx));

    // one connection in the worker, one queued, one waiting for room
    let mut idle = Vec::new();
    for _ in 0..3 {
        idle.push(TcpStream::connect(addr).await.unwrap());
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    let started = Instant::now();
    stop_tx.send(true).unwrap();
    let drain = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("listener did not stop while the queue was full")
        .unwrap();

    assert_eq!(drain, Drain::Forced);
    assert!(started.elapsed() < Duration::from_secs(5));
    drop(idle);
}

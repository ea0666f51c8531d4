//! Accept loop and worker pool.

pub mod listener;
pub mod pool;

use std::time::Duration;

use crate::config::Config;
use crate::http::mime::MimeTable;

/// Everything a connection needs that outlives it. Built once before the
/// listener starts and shared read-only.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub config: Config,
    pub mime: MimeTable,
}

impl ServerContext {
    pub fn new(config: Config, mime: MimeTable) -> Self {
        Self { config, mime }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.config.server.connection_timeout()
    }
}

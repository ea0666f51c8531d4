use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PORTICO_CONFIG";
/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "LISTEN_PORT";
const DEFAULT_CONFIG_PATH: &str = "conf/server.yaml";

/// Server configuration. Every field has a default, so an empty or missing
/// file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Address to bind; all interfaces when absent
    pub hostname: Option<String>,
    /// Number of connection workers
    pub pool_size: usize,
    /// Accepted connections waiting for a free worker
    pub queue_size: usize,
    /// Listen backlog
    pub backlog: u32,
    pub connection_timeout_ms: u64,
    pub accept_poll_ms: u64,
    pub shutdown_grace_secs: u64,
    /// Value of the `Server` response header
    pub server_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Document root
    pub root: PathBuf,
    /// Default upload directory, relative to the document root
    pub upload_dir: String,
    /// `mime.types` file
    pub mime_types: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            hostname: None,
            pool_size: 50,
            queue_size: 500,
            backlog: 500,
            connection_timeout_ms: 20_000,
            accept_poll_ms: 1_000,
            shutdown_grace_secs: 60,
            server_name: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("webapps"),
            upload_dir: "root/upload".to_string(),
            mime_types: PathBuf::from("conf/mime.types"),
        }
    }
}

impl Config {
    /// Loads the file named by `PORTICO_CONFIG` (or `conf/server.yaml`).
    /// A missing file gives the defaults; `LISTEN_PORT` overrides the port.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut cfg = Self::load_file(&path)?;

        if let Ok(port) = std::env::var(PORT_ENV) {
            cfg.server.port = port
                .parse()
                .with_context(|| format!("{} is not a valid port: {}", PORT_ENV, port))?;
        }

        Ok(cfg)
    }

    pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text)
                .with_context(|| format!("invalid configuration in {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
        }
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

impl ServerConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn accept_poll(&self) -> Duration {
        Duration::from_millis(self.accept_poll_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl StaticConfig {
    /// Absolute-or-relative filesystem location of the default upload directory.
    pub fn upload_path(&self) -> PathBuf {
        self.upload_dir
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// URL path of the default upload directory, e.g. `/root/upload`.
    pub fn upload_url(&self) -> String {
        let segments: Vec<&str> = self
            .upload_dir
            .split(['/', '\\'])
            .filter(|s| !s.is_empty())
            .collect();
        format!("/{}", segments.join("/"))
    }
}

//! Layered server configuration: defaults, an optional TOML file, then
//! CLI flags, highest precedence last.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default cache capacity: 10 MiB.
pub const DEFAULT_CACHE_CAPACITY_BYTES: usize = 10 * 1024 * 1024;

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY_BYTES
}

/// File-level configuration, as loaded from an optional TOML document.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub worker_threads: Option<usize>,
    pub cache_capacity_bytes: Option<usize>,
    pub directory: Option<PathBuf>,
    pub log_directory: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::config(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("reading {}: {e}", path.display())))?;
        Self::from_str(&contents)
    }
}

/// Fully resolved server configuration, ready to hand to [`crate::server::Server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub worker_threads: usize,
    pub cache_capacity_bytes: usize,
    pub directory: PathBuf,
    pub log_directory: Option<PathBuf>,
}

impl ServerConfig {
    /// Compose defaults, an optional file layer, and explicit CLI overrides.
    /// `directory` is mandatory and always comes from the CLI.
    pub fn resolve(
        file: Option<FileConfig>,
        directory: PathBuf,
        cli_address: Option<String>,
        cli_port: Option<u16>,
        cli_workers: Option<usize>,
        log_directory: Option<PathBuf>,
    ) -> Self {
        let file = file.unwrap_or_default();

        let address = cli_address.or(file.address).unwrap_or_else(default_address);
        let port = cli_port.or(file.port).unwrap_or_else(default_port);
        let worker_threads = cli_workers
            .or(file.worker_threads)
            .unwrap_or_else(default_worker_threads);
        let cache_capacity_bytes =
            file.cache_capacity_bytes.unwrap_or_else(default_cache_capacity);
        let directory = if directory.as_os_str().is_empty() {
            file.directory.unwrap_or(directory)
        } else {
            directory
        };
        let log_directory = log_directory.or(file.log_directory);

        Self {
            address,
            port,
            worker_threads,
            cache_capacity_bytes,
            directory,
            log_directory,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .max(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_defaults_and_cli_overrides_file() {
        let file = FileConfig::from_str("address = \"0.0.0.0\"\nport = 9090\n").unwrap();
        let cfg = ServerConfig::resolve(
            Some(file),
            PathBuf::from("/srv/www"),
            None,
            Some(9999),
            None,
            None,
        );
        assert_eq!(cfg.address, "0.0.0.0");
        assert_eq!(cfg.port, 9999);
        assert_eq!(cfg.cache_capacity_bytes, DEFAULT_CACHE_CAPACITY_BYTES);
    }

    #[test]
    fn defaults_apply_with_no_file() {
        let cfg = ServerConfig::resolve(None, PathBuf::from("/srv/www"), None, None, None, None);
        assert_eq!(cfg.address, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.worker_threads >= 2);
    }
}

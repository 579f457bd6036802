//! CLI entrypoint: `server [--address ..] [--port ..] [--workers ..] [--config ..] <directory>`.

use clap::Parser;
use longlp_server::config::{FileConfig, ServerConfig};
use longlp_server::http::handle_request;
use longlp_server::{Cache, NetAddress, Server};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "longlp-server", about = "A minimal HTTP/1.1 + CGI server")]
struct Cli {
    /// Listen address.
    #[arg(long)]
    address: Option<String>,

    /// Listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Reactor worker thread count.
    #[arg(long)]
    workers: Option<usize>,

    /// Optional TOML configuration file, overridden by the flags above.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of static resources and `cgi-bin/`; must already exist.
    directory: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    if !cli.directory.is_dir() {
        eprintln!("not found directory {}", cli.directory.display());
        std::process::exit(1);
    }

    let file_config = match &cli.config {
        Some(path) => match FileConfig::from_path(path) {
            Ok(cfg) => Some(cfg),
            Err(err) => {
                eprintln!("failed to load config {}: {err}", path.display());
                std::process::exit(1);
            }
        },
        None => None,
    };

    let config = ServerConfig::resolve(
        file_config,
        cli.directory.clone(),
        cli.address,
        cli.port,
        cli.workers,
        None,
    );

    let _log_guard = longlp_server::logging::init(config.log_directory.as_deref());

    let address = match NetAddress::new(&config.address, config.port) {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(error = %err, "invalid listen address");
            std::process::exit(1);
        }
    };

    let mut server = match Server::new(address, config.worker_threads) {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(error = %err, "failed to construct server");
            std::process::exit(1);
        }
    };

    let shutdown_handle = server.shutdown_handle();
    if let Err(err) = ctrlc::set_handler(move || {
        tracing::info!("received interrupt, shutting down");
        shutdown_handle.shutdown();
    }) {
        tracing::warn!(error = %err, "failed to install SIGINT handler");
    }

    let cache = Arc::new(Cache::new(config.cache_capacity_bytes));
    let serving_directory = config.directory.to_string_lossy().into_owned();

    server.on_handle(Arc::new(move |connection| {
        handle_request(connection, &serving_directory, &cache);
    }));

    fmt_startup(&config);

    if let Err(err) = server.begin() {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}

fn fmt_startup(config: &ServerConfig) {
    tracing::info!(
        address = %config.bind_address(),
        workers = config.worker_threads,
        directory = %config.directory.display(),
        cache_capacity_bytes = config.cache_capacity_bytes,
        "starting longlp-server"
    );
}

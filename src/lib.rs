//! longlp-server: a multi-reactor, edge-triggered TCP server framework
//! with a concurrent LRU byte cache and a minimal HTTP/1.1 application
//! layer serving static files and CGI executables.
//!
//! # Architecture
//!
//! A [`Server`](server::Server) owns one listener [`Looper`](reactor::Looper)
//! and `worker_count` reactor `Looper`s, each driven by a dedicated
//! thread in a [`ThreadPool`](threadpool::ThreadPool). The listener's
//! [`Acceptor`](acceptor::Acceptor) accepts clients and hands each one,
//! wrapped in a non-blocking edge-triggered
//! [`Connection`](reactor::Connection), to a reactor chosen by a
//! [`DistributionAgent`](distribution::DistributionAgent). Every
//! `Connection` is driven by a single handler callable — in this crate's
//! binary, [`http::handle_request`] — which reads buffered bytes, parses
//! complete requests, and serves them from a shared
//! [`Cache`](cache::Cache) or a CGI child process.

pub mod acceptor;
pub mod buffer;
pub mod cache;
pub mod config;
pub mod distribution;
pub mod error;
pub mod http;
pub mod logging;
pub mod net;
pub mod reactor;
pub mod server;
pub mod threadpool;

pub use cache::Cache;
pub use config::ServerConfig;
pub use error::{Error, Result};
pub use net::address::NetAddress;
pub use server::Server;

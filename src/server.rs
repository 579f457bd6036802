//! `Server`: composes the listener `Looper`, reactor `Looper`s, the
//! `ThreadPool`, the `DistributionAgent`, and the `Acceptor`.

use crate::acceptor::{Acceptor, OnAccept, OnHandle};
use crate::distribution::DistributionAgent;
use crate::error::{Error, Result};
use crate::net::address::NetAddress;
use crate::reactor::looper::Looper;
use crate::reactor::connection::Connection;
use crate::threadpool::ThreadPool;
use std::sync::Arc;

/// Per-`Looper` epoll scratch-buffer size.
const POLLER_CAPACITY: usize = 1024;

pub struct Server {
    address: NetAddress,
    listener_looper: Arc<Looper>,
    reactor_loopers: Vec<Arc<Looper>>,
    pool: ThreadPool,
    agent: Arc<DistributionAgent>,
    on_handle: Option<OnHandle>,
    on_accept: Option<OnAccept>,
    acceptor: Option<Acceptor>,
}

impl Server {
    /// Construct the listener and reactor `Looper`s and register every
    /// reactor with the `DistributionAgent`. The `Acceptor` itself is
    /// built lazily in [`begin`](Self::begin), once `on_handle` has been
    /// installed — deferring it avoids making the handler hooks mutable
    /// fields on an already-registered listener connection.
    pub fn new(address: NetAddress, worker_count: usize) -> Result<Self> {
        let listener_looper = Looper::new(POLLER_CAPACITY)?;
        let pool = ThreadPool::new(worker_count);

        let mut agent = DistributionAgent::new();
        let mut reactor_loopers = Vec::with_capacity(pool.worker_count());
        for _ in 0..pool.worker_count() {
            let looper = Looper::new(POLLER_CAPACITY)?;
            agent.add_candidate(Arc::clone(&looper));
            reactor_loopers.push(looper);
        }

        Ok(Self {
            address,
            listener_looper,
            reactor_loopers,
            pool,
            agent: Arc::new(agent),
            on_handle: None,
            on_accept: None,
            acceptor: None,
        })
    }

    pub fn on_handle(&mut self, handler: OnHandle) -> &mut Self {
        self.on_handle = Some(handler);
        self
    }

    pub fn on_accept(&mut self, handler: OnAccept) -> &mut Self {
        self.on_accept = Some(handler);
        self
    }

    /// Submit every reactor's event loop to the pool, build the
    /// `Acceptor`, then run the listener loop on the calling thread
    /// until [`shutdown`](Self::shutdown) is called from elsewhere.
    pub fn begin(&mut self) -> Result<()> {
        let on_handle = self
            .on_handle
            .clone()
            .ok_or_else(|| Error::reactor("on_handle must be set before begin()"))?;
        let on_accept: OnAccept =
            self.on_accept.clone().unwrap_or_else(|| Arc::new(|_: &mut Connection| {}));

        for looper in &self.reactor_loopers {
            let looper = Arc::clone(looper);
            // The reactor loop runs until `shutdown()`; its `TaskHandle`
            // is only useful for recovering a task's return value, which
            // nothing here needs, so it's dropped immediately.
            let _handle = self
                .pool
                .submit_task(move || looper.start_loop())
                .map_err(Error::reactor)?;
        }

        let acceptor = Acceptor::new(
            &self.listener_looper,
            Arc::clone(&self.agent),
            &self.address,
            on_handle,
            on_accept,
        )?;
        self.acceptor = Some(acceptor);

        tracing::info!(address = %self.address, reactors = self.reactor_loopers.len(), "server listening");
        self.listener_looper.start_loop();
        Ok(())
    }

    /// Signal an orderly shutdown: the listener loop unblocks first
    /// (unwinding `begin()`), then every reactor loop is signalled to
    /// exit. Dropping the `Server` afterwards joins the thread pool.
    pub fn shutdown(&self) {
        self.listener_looper.exit();
        for looper in &self.reactor_loopers {
            looper.exit();
        }
    }

    pub fn reactor_count(&self) -> usize {
        self.reactor_loopers.len()
    }

    /// A cheap, `Send`-able handle that can trigger [`shutdown`](Self::shutdown)
    /// from another thread (e.g. a signal handler) while `begin()` is
    /// blocking the calling thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            listener_looper: Arc::clone(&self.listener_looper),
            reactor_loopers: self.reactor_loopers.clone(),
        }
    }
}

/// See [`Server::shutdown_handle`].
#[derive(Clone)]
pub struct ShutdownHandle {
    listener_looper: Arc<Looper>,
    reactor_loopers: Vec<Arc<Looper>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.listener_looper.exit();
        for looper in &self.reactor_loopers {
            looper.exit();
        }
    }
}

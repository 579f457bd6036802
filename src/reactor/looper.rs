//! `Looper`: a single event loop owning a [`Poller`] and the
//! `Connection`s registered on it.

use crate::error::Result;
use crate::reactor::connection::Connection;
use crate::reactor::poller::Poller;
use std::collections::HashMap;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// How long a single `poll` call blocks when nothing is ready.
const POLL_TIMEOUT_MS: i32 = 3000;

pub struct Looper {
    poller: Poller,
    connections: Mutex<HashMap<RawFd, Box<Connection>>>,
    pending_deletes: Mutex<Vec<RawFd>>,
    exiting: AtomicBool,
}

impl Looper {
    pub fn new(poller_capacity: usize) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            poller: Poller::new(poller_capacity)?,
            connections: Mutex::new(HashMap::new()),
            pending_deletes: Mutex::new(Vec::new()),
            exiting: AtomicBool::new(false),
        }))
    }

    /// Take ownership of `connection`, register it with the poller, and
    /// set its back-pointer to this `Looper` so its handler can later
    /// request its own deletion.
    pub fn add_connection(self: &Arc<Self>, mut connection: Connection) -> Result<()> {
        connection.set_looper(Arc::downgrade(self));
        let mut boxed = Box::new(connection);
        self.poller.add_connection(boxed.as_mut())?;
        let fd = boxed.fd();
        self.connections.lock().unwrap().insert(fd, boxed);
        Ok(())
    }

    /// Register a connection this `Looper` does not own (the acceptor's
    /// listener connection lives as long as the `Acceptor`, not this
    /// loop). Registration only; no map entry, so `delete_connection`
    /// cannot be used to remove it.
    ///
    /// `connection` must already be at its final heap address (boxed or
    /// otherwise pinned) before this call: the poller stores the raw
    /// pointer it's given here, and any later move of `*connection`
    /// would leave that pointer dangling.
    pub fn add_borrowed(&self, connection: &mut Connection) -> Result<()> {
        self.poller.add_connection(connection)
    }

    /// Drop the owned connection for `fd`, closing its socket. Returns
    /// `false` if `fd` is not known to this `Looper`.
    ///
    /// Only called from [`start_loop`](Self::start_loop) once it has
    /// finished dispatching the current batch of ready connections. A
    /// connection's handler must never call this directly, since that
    /// would drop the `Box<Connection>` the handler's own `&mut self` is
    /// still borrowed from. Handlers go through
    /// [`mark_for_deletion`](Self::mark_for_deletion) instead.
    fn delete_connection(&self, fd: RawFd) -> bool {
        let removed = self.connections.lock().unwrap().remove(&fd);
        match removed {
            Some(_) => {
                let _ = self.poller.remove_fd(fd);
                true
            }
            None => false,
        }
    }

    /// Queue `fd` for deletion once the current dispatch batch finishes.
    /// Called by [`Connection::request_self_delete`](crate::reactor::connection::Connection::request_self_delete);
    /// never deletes synchronously, since the connection calling this is
    /// still on the stack inside [`Connection::start`](crate::reactor::connection::Connection::start).
    pub fn mark_for_deletion(&self, fd: RawFd) {
        self.pending_deletes.lock().unwrap().push(fd);
    }

    pub fn exit(&self) {
        self.exiting.store(true, Ordering::SeqCst);
    }

    fn is_exiting(&self) -> bool {
        self.exiting.load(Ordering::SeqCst)
    }

    /// Run the loop on the calling thread until `exit()` is called.
    pub fn start_loop(self: &Arc<Self>) {
        while !self.is_exiting() {
            let ready = match self.poller.poll(POLL_TIMEOUT_MS) {
                Ok(ready) => ready,
                Err(err) => {
                    tracing::error!(error = %err, "poll failed");
                    continue;
                }
            };
            for conn_ptr in ready {
                // SAFETY: `conn_ptr` was handed to us by `Poller::poll`, which
                // only ever returns pointers into connections still present
                // either in `self.connections` or borrowed for this loop's
                // lifetime (the acceptor's listener connection). Deletion
                // requested from inside `start()` is deferred below, so the
                // `Box<Connection>` backing this pointer is guaranteed to
                // still be alive for every iteration of this loop.
                let connection: &mut Connection = unsafe { &mut *conn_ptr };
                connection.start();
            }

            // Drain deletions requested by this batch's handlers now that
            // no `&mut Connection` borrowed from `ready` is still live.
            let pending = std::mem::take(&mut *self.pending_deletes.lock().unwrap());
            for fd in pending {
                self.delete_connection(fd);
            }
        }
        tracing::info!("looper exiting");
    }
}

/// Convenience alias used by `Connection::request_self_delete`.
pub type LooperRef = Weak<Looper>;

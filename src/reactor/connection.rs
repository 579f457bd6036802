//! A `Connection` owns one socket and its read/write buffers, and is
//! dispatched to on readiness by whichever handler was installed on it.

use crate::buffer::Buffer;
use crate::net::socket::Socket;
use crate::reactor::looper::Looper;
use crate::reactor::poller::Interest;
use std::io;
use std::os::fd::RawFd;
use std::sync::{Arc, Weak};

/// Single read attempt size; the edge-triggered receive loop keeps
/// calling `recv` with a buffer this size until it sees `EAGAIN`.
const RECV_CHUNK: usize = 2048;

/// An `Arc` rather than a `Box` so [`Connection::start`] can clone the
/// handler out before calling it, instead of temporarily removing it
/// from `self`. Removing it would need putting it back afterwards,
/// which is unsound if the handler deletes the connection it was
/// called on.
pub type Handler = Arc<dyn Fn(&mut Connection) + Send + Sync>;

pub struct Connection {
    socket: Socket,
    read_buf: Buffer,
    write_buf: Buffer,
    monitored_events: u32,
    returned_events: u32,
    handler: Option<Handler>,
    looper: Weak<Looper>,
}

impl Connection {
    pub fn new(socket: Socket, monitored_events: u32) -> Self {
        Self {
            socket,
            read_buf: Buffer::new(),
            write_buf: Buffer::new(),
            monitored_events,
            returned_events: 0,
            handler: None,
            looper: Weak::new(),
        }
    }

    /// Build a non-blocking, edge-triggered client connection.
    pub fn new_client(socket: Socket) -> Self {
        Self::new(socket, Interest::READ | Interest::ET)
    }

    /// Build a level-triggered listener connection (read-only, no ET).
    pub fn new_listener(socket: Socket) -> Self {
        Self::new(socket, Interest::READ)
    }

    pub fn fd(&self) -> RawFd {
        self.socket.raw_fd()
    }

    /// Accept the next pending client on this (listener) connection's
    /// socket. See [`Socket::accept`] for the no-pending-connection
    /// contract.
    pub fn accept(&self) -> crate::error::Result<Option<(Socket, crate::net::address::NetAddress)>> {
        self.socket.accept()
    }

    pub fn interest(&self) -> u32 {
        self.monitored_events
    }

    pub fn set_returned_events(&mut self, events: u32) {
        self.returned_events = events;
    }

    pub fn returned_events(&self) -> u32 {
        self.returned_events
    }

    pub fn set_handler(&mut self, handler: Handler) {
        self.handler = Some(handler);
    }

    pub fn set_looper(&mut self, looper: Weak<Looper>) {
        self.looper = looper;
    }

    pub fn looper(&self) -> &Weak<Looper> {
        &self.looper
    }

    /// Ask this connection's owning `Looper` to drop it. Safe to call
    /// from inside the installed handler; the `Connection` must not be
    /// touched again afterwards. The drop itself is deferred until the
    /// `Looper` has finished dispatching the current batch of ready
    /// connections, since this connection's `Box` is still borrowed by
    /// the in-progress call to [`Connection::start`] at that point.
    pub fn request_self_delete(&self) {
        if let Some(looper) = self.looper.upgrade() {
            looper.mark_for_deletion(self.fd());
        }
    }

    /// Drain the socket into the read buffer until `EAGAIN`/`EWOULDBLOCK`.
    /// Returns `(bytes_read, peer_closed)`.
    pub fn receive(&mut self) -> (usize, bool) {
        let mut total = 0usize;
        let mut chunk = [0u8; RECV_CHUNK];
        loop {
            match self.socket.recv(&mut chunk) {
                Ok(0) => return (total, true),
                Ok(n) => {
                    self.read_buf.push_back(&chunk[..n]);
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return (total, false),
                Err(e) => {
                    tracing::warn!(error = %e, fd = self.fd(), "recv failed");
                    return (total, true);
                }
            }
        }
    }

    /// Write out the entire write buffer, tolerating `EINTR`/`EAGAIN`.
    /// The write buffer is cleared regardless of outcome.
    pub fn send(&mut self) {
        let data = self.write_buf.data().to_vec();
        let mut offset = 0usize;
        let mut stalls = 0u32;
        while offset < data.len() {
            match self.socket.send(&data[offset..]) {
                Ok(0) => break,
                Ok(n) => {
                    offset += n;
                    stalls = 0;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    stalls += 1;
                    if stalls > 10_000 {
                        tracing::warn!(fd = self.fd(), "send stalled, dropping remainder");
                        break;
                    }
                    std::thread::yield_now();
                }
                Err(e) => {
                    tracing::warn!(error = %e, fd = self.fd(), "send failed");
                    break;
                }
            }
        }
        self.write_buf.clear();
    }

    pub fn find_and_pop_till(&mut self, delimiter: &[u8]) -> Option<Vec<u8>> {
        self.read_buf.find_and_pop_till(delimiter)
    }

    pub fn read_size(&self) -> usize {
        self.read_buf.size()
    }

    pub fn clear_read(&mut self) {
        self.read_buf.clear();
    }

    pub fn push_write(&mut self, bytes: &[u8]) {
        self.write_buf.push_back(bytes);
    }

    pub fn write_size(&self) -> usize {
        self.write_buf.size()
    }

    /// Invoke the installed handler with `self`.
    ///
    /// Clones the `Arc` out of `self.handler` rather than `take()`ing it:
    /// the handler may call [`request_self_delete`](Self::request_self_delete),
    /// and a `take`-then-reinstall would write back into `self` after the
    /// handler returns, which is unsound once the connection's `Box` is
    /// gone. Cloning leaves `self.handler` untouched, so there is nothing
    /// to reinstall.
    pub fn start(&mut self) {
        match self.handler.clone() {
            Some(handler) => handler(self),
            None => tracing::warn!(fd = self.fd(), "connection became ready with no handler installed"),
        }
    }
}

//! A thin, safe wrapper over raw `epoll` syscalls.
//!
//! `mio`'s epoll backend is always edge-triggered internally and cannot
//! express this server's explicit split between a level-triggered
//! listener and edge-triggered clients, so this wraps `libc::epoll_*`
//! directly instead, mirroring the original C++ poller almost 1:1.

use crate::error::{Error, Result};
use crate::reactor::connection::Connection;
use std::cell::UnsafeCell;
use std::io;
use std::os::fd::RawFd;

/// Readiness interest bits, matching the raw epoll flags they map to.
pub struct Interest;

impl Interest {
    pub const READ: u32 = libc::EPOLLIN as u32;
    pub const ET: u32 = libc::EPOLLET as u32;
}

/// Edge-triggered (or level-triggered, per registered interest)
/// readiness multiplexer. Never owns the `Connection`s it's told about —
/// it only carries a raw pointer to each, valid for as long as the
/// owning `Looper`'s map entry is alive.
///
/// `poll` takes `&self` rather than `&mut self` even though it mutates
/// the scratch event buffer: `epoll_ctl` and `epoll_wait` are safe to
/// call concurrently from different threads on the same epoll fd, and
/// this wrapper leans on that to let `add_connection`/`remove_fd` be
/// called from any thread while the owning `Looper`'s dedicated thread
/// is blocked in `poll`. The invariant callers must uphold: only one
/// thread ever calls `poll` on a given `Poller` (the reactor's own
/// loop thread).
pub struct Poller {
    epfd: RawFd,
    events: UnsafeCell<Vec<libc::epoll_event>>,
}

unsafe impl Send for Poller {}
unsafe impl Sync for Poller {}

impl Poller {
    pub fn new(capacity: usize) -> Result<Self> {
        let epfd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if epfd < 0 {
            return Err(Error::reactor(format!(
                "epoll_create1 failed: {}",
                io::Error::last_os_error()
            )));
        }
        let events = vec![unsafe { std::mem::zeroed() }; capacity.max(1)];
        Ok(Self { epfd, events: UnsafeCell::new(events) })
    }

    /// Register `connection`'s fd with its configured interest mask. The
    /// connection's address is stashed as epoll user data so `poll` can
    /// recover it without a map lookup.
    pub fn add_connection(&self, connection: &mut Connection) -> Result<()> {
        let fd = connection.fd();
        let mut ev: libc::epoll_event = unsafe { std::mem::zeroed() };
        ev.events = connection.interest();
        ev.u64 = connection as *mut Connection as u64;
        let rc = unsafe { libc::epoll_ctl(self.epfd, libc::EPOLL_CTL_ADD, fd, &mut ev) };
        if rc < 0 {
            return Err(Error::reactor(format!(
                "epoll_ctl(ADD) failed: {}",
                io::Error::last_os_error()
            )));
        }
        Ok(())
    }

    pub fn remove_fd(&self, fd: RawFd) -> Result<()> {
        let rc =
            unsafe { libc::epoll_ctl(self.epfd, libc::EPOLL_CTL_DEL, fd, std::ptr::null_mut()) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            // Already gone (e.g. the peer closed and the fd was reused) isn't fatal.
            if err.raw_os_error() != Some(libc::ENOENT) {
                return Err(Error::reactor(format!("epoll_ctl(DEL) failed: {err}")));
            }
        }
        Ok(())
    }

    /// Block up to `timeout_ms` (or indefinitely if negative) and return
    /// raw pointers to the `Connection`s that became ready. The caller
    /// (the owning `Looper`, on its single thread) is responsible for
    /// ensuring these pointers are dereferenced only while their entries
    /// remain alive in its connection map.
    pub fn poll(&self, timeout_ms: i32) -> Result<Vec<*mut Connection>> {
        // SAFETY: upheld by the single-caller invariant documented on the struct.
        let events = unsafe { &mut *self.events.get() };
        let n = unsafe {
            libc::epoll_wait(self.epfd, events.as_mut_ptr(), events.len() as i32, timeout_ms)
        };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(Error::reactor(format!("epoll_wait failed: {err}")));
        }

        let mut ready = Vec::with_capacity(n as usize);
        for ev in &events[..n as usize] {
            let conn = ev.u64 as *mut Connection;
            unsafe { (*conn).set_returned_events(ev.events) };
            ready.push(conn);
        }
        Ok(ready)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        unsafe { libc::close(self.epfd) };
    }
}

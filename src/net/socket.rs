//! `Socket`: an exclusively-owned OS socket descriptor.

use crate::error::{Error, Result};
use crate::net::address::{NetAddress, Protocol};
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

/// Backlog passed to `listen(2)`.
const LISTEN_BACKLOG: i32 = 128;

/// An owned socket file descriptor. Closes on drop.
#[derive(Debug)]
pub struct Socket {
    fd: Option<OwnedFd>,
    protocol: Option<Protocol>,
}

impl Socket {
    /// An empty socket with no underlying fd yet; the fd is created lazily
    /// by the first call to `bind` or `connect`, matching the original's
    /// on-demand socket creation.
    pub fn empty() -> Self {
        Self { fd: None, protocol: None }
    }

    /// Wrap an fd obtained from `accept`. Takes ownership.
    pub fn from_raw_fd(fd: RawFd, protocol: Protocol) -> Self {
        let owned = unsafe { OwnedFd::from_raw_fd(fd) };
        Self { fd: Some(owned), protocol: Some(protocol) }
    }

    pub fn raw_fd(&self) -> RawFd {
        self.fd.as_ref().map(|f| f.as_raw_fd()).unwrap_or(-1)
    }

    fn ensure_fd(&mut self, protocol: Protocol) -> Result<RawFd> {
        if let Some(fd) = &self.fd {
            return Ok(fd.as_raw_fd());
        }
        let domain = match protocol {
            Protocol::V4 => libc::AF_INET,
            Protocol::V6 => libc::AF_INET6,
        };
        let raw = unsafe { libc::socket(domain, libc::SOCK_STREAM, 0) };
        if raw < 0 {
            return Err(Error::Io { source: io::Error::last_os_error() });
        }
        self.fd = Some(unsafe { OwnedFd::from_raw_fd(raw) });
        self.protocol = Some(protocol);
        Ok(raw)
    }

    /// Mark the socket address- and port-reusable (`SO_REUSEADDR` and
    /// `SO_REUSEPORT`).
    pub fn set_reusable(&mut self, protocol: Protocol) -> Result<()> {
        let fd = self.ensure_fd(protocol)?;
        let one: libc::c_int = 1;
        for opt in [libc::SO_REUSEADDR, libc::SO_REUSEPORT] {
            let rc = unsafe {
                libc::setsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    opt,
                    &one as *const _ as *const libc::c_void,
                    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
                )
            };
            if rc < 0 {
                return Err(Error::Io { source: io::Error::last_os_error() });
            }
        }
        Ok(())
    }

    pub fn set_non_blocking(&self) -> Result<()> {
        let fd = self.raw_fd();
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL, 0) };
        if flags < 0 {
            return Err(Error::Io { source: io::Error::last_os_error() });
        }
        let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
        if rc < 0 {
            return Err(Error::Io { source: io::Error::last_os_error() });
        }
        Ok(())
    }

    /// Read back the socket's current `fcntl(F_GETFL)` status flags
    /// (e.g. `O_NONBLOCK`).
    pub fn get_attrs(&self) -> Result<i32> {
        let flags = unsafe { libc::fcntl(self.raw_fd(), libc::F_GETFL, 0) };
        if flags < 0 {
            return Err(Error::Io { source: io::Error::last_os_error() });
        }
        Ok(flags)
    }

    /// Bind to `address`. Creates the underlying fd if needed, choosing
    /// the address family from `address.protocol()`. When `reusable` is
    /// set, `SO_REUSEADDR`/`SO_REUSEPORT` are applied before binding.
    pub fn bind(&mut self, address: &NetAddress, reusable: bool) -> Result<()> {
        let protocol = address.protocol();
        if reusable {
            self.set_reusable(protocol)?;
        }
        let fd = self.ensure_fd(protocol)?;
        let (storage, len) = address.to_raw();
        let rc = unsafe { libc::bind(fd, &storage as *const _ as *const libc::sockaddr, len) };
        if rc < 0 {
            return Err(Error::Io { source: io::Error::last_os_error() });
        }
        Ok(())
    }

    /// Start listening with a fixed backlog of 128 pending connections.
    pub fn listen(&self) -> Result<()> {
        let rc = unsafe { libc::listen(self.raw_fd(), LISTEN_BACKLOG) };
        if rc < 0 {
            return Err(Error::Io { source: io::Error::last_os_error() });
        }
        Ok(())
    }

    /// Accept the next pending client connection. Returns `None` when no
    /// connection is pending (`EAGAIN`/`EWOULDBLOCK`) — not an error; the
    /// caller retries on the next readiness event.
    ///
    /// The accepted socket is returned non-blocking and close-on-exec.
    pub fn accept(&self) -> Result<Option<(Socket, NetAddress)>> {
        let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
        let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

        let fd = unsafe {
            libc::accept4(
                self.raw_fd(),
                &mut storage as *mut _ as *mut libc::sockaddr,
                &mut len,
                libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
            )
        };
        if fd < 0 {
            let err = io::Error::last_os_error();
            return match err.kind() {
                io::ErrorKind::WouldBlock => Ok(None),
                _ => {
                    tracing::warn!(error = %err, "accept failed");
                    Ok(None)
                }
            };
        }

        let peer = NetAddress::from_raw(&storage, len)?;
        let protocol = peer.protocol();
        Ok(Some((Socket::from_raw_fd(fd, protocol), peer)))
    }

    /// Connect to `address`, creating the underlying fd on demand.
    pub fn connect(&mut self, address: &NetAddress) -> Result<()> {
        let protocol = address.protocol();
        let fd = self.ensure_fd(protocol)?;
        let (storage, len) = address.to_raw();
        let rc = unsafe { libc::connect(fd, &storage as *const _ as *const libc::sockaddr, len) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::WouldBlock {
                return Err(Error::Io { source: err });
            }
        }
        Ok(())
    }

    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe {
            libc::recv(self.raw_fd(), buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0)
        };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }

    pub fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe {
            libc::send(
                self.raw_fd(),
                buf.as_ptr() as *const libc::c_void,
                buf.len(),
                libc::MSG_NOSIGNAL,
            )
        };
        if n < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(n as usize)
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        // OwnedFd closes the descriptor for us.
    }
}

impl IntoRawFd for Socket {
    fn into_raw_fd(mut self) -> RawFd {
        self.fd.take().map(|f| f.into_raw_fd()).unwrap_or(-1)
    }
}

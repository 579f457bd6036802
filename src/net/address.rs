//! `NetAddress`: an IPv4/IPv6 endpoint value, convertible to/from the raw
//! `sockaddr` representation the `Socket` syscalls need.

use crate::error::{Error, Result};
use std::fmt;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Address family of a [`NetAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    V4,
    V6,
}

/// A value-type network endpoint: an IP address plus a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetAddress {
    addr: SocketAddr,
}

impl NetAddress {
    /// Parse `ip_text` and pair it with `port`. The protocol is inferred
    /// from the textual form of the address.
    pub fn new(ip_text: &str, port: u16) -> Result<Self> {
        let ip: IpAddr = ip_text
            .parse()
            .map_err(|_| Error::socket(format!("invalid address: {ip_text}")))?;
        Ok(Self { addr: SocketAddr::new(ip, port) })
    }

    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// A zero-initialized address of the given family, suitable as the
    /// out-parameter for `accept()`.
    pub fn unspecified(protocol: Protocol) -> Self {
        let ip = match protocol {
            Protocol::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            Protocol::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        Self { addr: SocketAddr::new(ip, 0) }
    }

    pub fn protocol(&self) -> Protocol {
        match self.addr {
            SocketAddr::V4(_) => Protocol::V4,
            SocketAddr::V6(_) => Protocol::V6,
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Fill a raw `sockaddr_storage` for use in a `bind`/`connect` syscall.
    /// Returns the storage and the length the syscall should be told about.
    pub fn to_raw(&self) -> (libc::sockaddr_storage, libc::socklen_t) {
        let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
        let len = match self.addr {
            SocketAddr::V4(v4) => {
                let sin = libc::sockaddr_in {
                    sin_family: libc::AF_INET as libc::sa_family_t,
                    sin_port: v4.port().to_be(),
                    sin_addr: libc::in_addr { s_addr: u32::from_ne_bytes(v4.ip().octets()) },
                    sin_zero: [0; 8],
                };
                unsafe {
                    std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in, sin);
                }
                mem::size_of::<libc::sockaddr_in>() as libc::socklen_t
            }
            SocketAddr::V6(v6) => {
                let sin6 = libc::sockaddr_in6 {
                    sin6_family: libc::AF_INET6 as libc::sa_family_t,
                    sin6_port: v6.port().to_be(),
                    sin6_flowinfo: v6.flowinfo(),
                    sin6_addr: libc::in6_addr { s6_addr: v6.ip().octets() },
                    sin6_scope_id: v6.scope_id(),
                };
                unsafe {
                    std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in6, sin6);
                }
                mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t
            }
        };
        (storage, len)
    }

    /// Reconstruct a [`NetAddress`] from a `sockaddr_storage` filled in by
    /// `accept()`/`getsockname()`.
    pub fn from_raw(storage: &libc::sockaddr_storage, _len: libc::socklen_t) -> Result<Self> {
        match storage.ss_family as i32 {
            libc::AF_INET => {
                let sin = unsafe { &*(storage as *const _ as *const libc::sockaddr_in) };
                let ip = Ipv4Addr::from(u32::from_ne_bytes(sin.sin_addr.s_addr.to_ne_bytes()));
                let port = u16::from_be(sin.sin_port);
                Ok(Self { addr: SocketAddr::new(IpAddr::V4(ip), port) })
            }
            libc::AF_INET6 => {
                let sin6 = unsafe { &*(storage as *const _ as *const libc::sockaddr_in6) };
                let ip = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
                let port = u16::from_be(sin6.sin6_port);
                Ok(Self { addr: SocketAddr::new(IpAddr::V6(ip), port) })
            }
            other => Err(Error::socket(format!("unsupported address family: {other}"))),
        }
    }
}

impl fmt::Display for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.addr.ip(), self.addr.port())
    }
}

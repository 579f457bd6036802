//! Network primitives: endpoint addressing and owned socket descriptors.

pub mod address;
pub mod socket;

pub use address::{NetAddress, Protocol};
pub use socket::Socket;

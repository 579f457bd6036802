//! The event-loop core: an edge-triggered [`Poller`], per-socket
//! [`Connection`]s, and the single-threaded [`Looper`] that ties them
//! together.

pub mod connection;
pub mod looper;
pub mod poller;

pub use connection::Connection;
pub use looper::Looper;
pub use poller::{Interest, Poller};

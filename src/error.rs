//! Crate-wide error type.
//!
//! Fatal bind/listen/poll failures, cache misuse, config errors and CGI
//! faults all flow through this enum. Per-connection faults (malformed
//! HTTP, missing files) are translated into HTTP responses at the
//! dispatch layer and never reach this type.

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying OS I/O failure (bind, listen, epoll_create, fcntl, ...).
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A socket-level failure that isn't a plain `io::Error`, such as an
    /// unsupported address family or a raw syscall returning -1.
    #[error("socket error: {message}")]
    Socket { message: String },

    /// Reactor/poller construction or registration failure.
    #[error("reactor error: {message}")]
    Reactor { message: String },

    /// Cache misuse (e.g. a caller-side invariant violation).
    #[error("cache error: {message}")]
    Cache { message: String },

    /// Configuration loading/validation failure.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// CGI process spawn/wait/read failure.
    #[error("cgi error: {message}")]
    Cgi { message: String },

    /// Generic error with free-form context.
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    pub fn socket<S: Into<String>>(message: S) -> Self {
        Self::Socket { message: message.into() }
    }

    pub fn reactor<S: Into<String>>(message: S) -> Self {
        Self::Reactor { message: message.into() }
    }

    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache { message: message.into() }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn cgi<S: Into<String>>(message: S) -> Self {
        Self::Cgi { message: message.into() }
    }

    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other { message: message.into() }
    }

    /// Category label used in log correlation.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Socket { .. } => "socket",
            Self::Reactor { .. } => "reactor",
            Self::Cache { .. } => "cache",
            Self::Config { .. } => "config",
            Self::Cgi { .. } => "cgi",
            Self::Other { .. } => "other",
        }
    }

    /// True for failures that should not take the whole process down.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Cgi { .. } | Self::Cache { .. })
    }
}

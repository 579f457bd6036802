//! The HTTP/1.1 subset application layer: request parsing, response
//! building, CGI execution, and the dispatch glue that ties them to a
//! [`crate::reactor::Connection`].

pub mod cgi;
pub mod dispatch;
pub mod header;
pub mod mime;
pub mod request;
pub mod response;

pub use dispatch::handle_request;
pub use header::Header;
pub use request::{Method, Request, Version};
pub use response::Response;

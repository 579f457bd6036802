//! Builds the status line + header block for each of the four response
//! shapes this server ever sends. Body bytes are never owned by a
//! `Response` — [`Response::serialize`] appends headers only, and the
//! caller appends the body afterwards so cached content can be streamed
//! without an extra copy.

use crate::http::header::Header;
use crate::http::mime;
use std::path::Path;

const SERVER_NAME: &str = "longlp/1.0";

pub struct Response {
    status_line: String,
    headers: Vec<Header>,
}

impl Response {
    /// `200 OK`. If `resource` names a file that exists, `Content-Length`
    /// is its size and `Content-Type` is derived from its extension;
    /// otherwise the response carries `Content-Length: 0`.
    pub fn make_200(should_close: bool, resource: Option<&Path>) -> Self {
        let mut resp = Self::new("HTTP/1.1 200 OK", should_close);
        match resource.and_then(|path| std::fs::metadata(path).ok().map(|m| (path, m))) {
            Some((path, meta)) => {
                resp.headers.push(Header::new("Content-Length", meta.len().to_string()));
                resp.headers.push(Header::new("Content-Type", mime::for_path(path)));
            }
            None => {
                resp.headers.push(Header::new("Content-Length", "0"));
            }
        }
        resp
    }

    pub fn make_400() -> Self {
        Self::empty_body("HTTP/1.1 400 Bad Request")
    }

    pub fn make_404() -> Self {
        Self::empty_body("HTTP/1.1 404 Not Found")
    }

    pub fn make_503() -> Self {
        Self::empty_body("HTTP/1.1 503 Service Unavailable")
    }

    fn empty_body(status_line: &str) -> Self {
        let mut resp = Self::new(status_line, true);
        resp.headers.push(Header::new("Content-Length", "0"));
        resp
    }

    fn new(status_line: &str, should_close: bool) -> Self {
        let connection = if should_close { "Close" } else { "Keep-Alive" };
        Self {
            status_line: status_line.to_string(),
            headers: vec![
                Header::new("Server", SERVER_NAME),
                Header::new("Connection", connection),
            ],
        }
    }

    /// Append `status_line CRLF`, every header line, and a terminating
    /// CRLF. No body bytes are written — that's on the caller.
    pub fn serialize(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(self.status_line.as_bytes());
        buffer.extend_from_slice(b"\r\n");
        for header in &self.headers {
            buffer.extend_from_slice(header.serialize().as_bytes());
        }
        buffer.extend_from_slice(b"\r\n");
    }

    /// Linear scan for a header whose key equals `key` exactly (no
    /// case-folding). Returns `false` if no such header exists.
    pub fn change_header(&mut self, key: &str, new_value: impl Into<String>) -> bool {
        match self.headers.iter_mut().find(|h| h.key == key) {
            Some(h) => {
                h.value = new_value.into();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_oh_four_carries_close_and_zero_length() {
        let resp = Response::make_404();
        let mut buf = Vec::new();
        resp.serialize(&mut buf);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Connection:Close\r\n"));
        assert!(text.contains("Content-Length:0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn two_hundred_with_missing_resource_has_zero_length() {
        let resp = Response::make_200(false, Some(Path::new("/does/not/exist.html")));
        let mut buf = Vec::new();
        resp.serialize(&mut buf);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Content-Length:0\r\n"));
        assert!(text.contains("Connection:Keep-Alive\r\n"));
    }

    #[test]
    fn two_hundred_with_existing_resource_reports_size_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, b"hello world").unwrap();

        let resp = Response::make_200(true, Some(&path));
        let mut buf = Vec::new();
        resp.serialize(&mut buf);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Content-Length:11\r\n"));
        assert!(text.contains("Content-Type:text/html\r\n"));
        assert!(text.contains("Connection:Close\r\n"));
    }

    #[test]
    fn change_header_updates_existing_key_only() {
        let mut resp = Response::make_200(false, None);
        assert!(resp.change_header("Content-Length", "42"));
        assert!(!resp.change_header("Not-Present", "x"));
        let mut buf = Vec::new();
        resp.serialize(&mut buf);
        assert!(String::from_utf8(buf).unwrap().contains("Content-Length:42\r\n"));
    }
}

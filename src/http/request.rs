//! Parses the raw bytes of one `\r\n\r\n`-terminated HTTP request.

use crate::http::header::Header;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http11,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub version: Version,
    pub headers: Vec<Header>,
    pub should_close: bool,
}

impl Request {
    /// Parse the exact bytes returned by `Buffer::find_and_pop_till(b"\r\n\r\n")`.
    pub fn parse(raw: &[u8]) -> Result<Self, String> {
        let text = String::from_utf8_lossy(raw);
        let parts: Vec<&str> = text.split("\r\n").collect();
        if parts.last() != Some(&"") {
            return Err("Ending of the request is not \r\n\r\n".to_string());
        }
        // Drop the trailing artifact empty string produced by the final \r\n.
        let lines = &parts[..parts.len() - 1];
        let (first_line, rest) =
            lines.split_first().ok_or_else(|| "empty request".to_string())?;

        let tokens: Vec<&str> = first_line.split(' ').filter(|t| !t.is_empty()).collect();
        if tokens.len() != 3 {
            return Err(format!("Invalid first request headline: {first_line}"));
        }

        let method = parse_method(tokens[0])
            .ok_or_else(|| format!("Unsupported method: {}", tokens[0]))?;
        let mut url = tokens[1].to_string();
        let version = parse_version(tokens[2])
            .ok_or_else(|| format!("Unsupported version: {}", tokens[2]))?;

        if url.is_empty() || url.ends_with('/') {
            url.push_str("index.html");
        }

        let mut headers = Vec::new();
        let mut should_close = true;
        for line in rest {
            if line.is_empty() {
                break;
            }
            let header =
                Header::parse(line).ok_or_else(|| format!("Invalid header line: {line}"))?;
            if header.key_eq_ignore_case("Connection") && header.value.eq_ignore_ascii_case("Keep-Alive")
            {
                should_close = false;
            }
            headers.push(header);
        }

        Ok(Self { method, url, version, headers, should_close })
    }
}

fn parse_method(token: &str) -> Option<Method> {
    match token.trim().to_ascii_uppercase().as_str() {
        "GET" => Some(Method::Get),
        "HEAD" => Some(Method::Head),
        _ => None,
    }
}

fn parse_version(token: &str) -> Option<Version> {
    match token.trim() {
        "HTTP/1.1" => Some(Version::Http11),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_root_request_with_keep_alive() {
        let raw = b"GET / HTTP/1.1\r\nConnection: Keep-Alive\r\n\r\n";
        let req = Request::parse(raw).unwrap();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url, "/index.html");
        assert_eq!(req.version, Version::Http11);
        assert!(!req.should_close);
    }

    #[test]
    fn default_connection_is_close() {
        let raw = b"GET /page.html HTTP/1.1\r\n\r\n";
        let req = Request::parse(raw).unwrap();
        assert!(req.should_close);
    }

    #[test]
    fn missing_trailing_crlf_is_invalid() {
        let raw = b"GET / HTTP/1.1\r\n";
        assert!(Request::parse(raw).is_err());
    }

    #[test]
    fn wrong_token_count_on_first_line_is_invalid() {
        let raw = b"GET /\r\n\r\n";
        let err = Request::parse(raw).unwrap_err();
        assert!(err.starts_with("Invalid first request headline"));
    }

    #[test]
    fn unsupported_method_is_invalid() {
        let raw = b"POST / HTTP/1.1\r\n\r\n";
        assert!(Request::parse(raw).is_err());
    }

    #[test]
    fn invalid_header_line_is_invalid() {
        let raw = b"GET / HTTP/1.1\r\ngarbage\r\n\r\n";
        assert!(Request::parse(raw).is_err());
    }

    #[test]
    fn host_header_value_with_colon_is_preserved() {
        let raw = b"GET / HTTP/1.1\r\nHost: 127.0.0.1:20080\r\n\r\n";
        let req = Request::parse(raw).unwrap();
        assert_eq!(req.headers[0].value, "127.0.0.1:20080");
    }
}

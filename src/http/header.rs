//! A single `key:value` HTTP header line.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    /// Parse a single header line (no trailing CRLF). Fewer than two
    /// `:`-separated tokens is invalid. A value containing further `:`s
    /// (e.g. `Host: 127.0.0.1:20080`) is rejoined with `:`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.splitn(2, ':');
        let key = parts.next()?.trim().to_string();
        let value = parts.next()?.trim().to_string();
        if key.is_empty() {
            return None;
        }
        Some(Self { key, value })
    }

    pub fn serialize(&self) -> String {
        format!("{}:{}\r\n", self.key, self.value)
    }

    pub fn key_eq_ignore_case(&self, other: &str) -> bool {
        self.key.eq_ignore_ascii_case(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_header() {
        let h = Header::parse("Content-Length: 11").unwrap();
        assert_eq!(h.key, "Content-Length");
        assert_eq!(h.value, "11");
    }

    #[test]
    fn value_with_colon_is_preserved() {
        let h = Header::parse("Host: 127.0.0.1:20080").unwrap();
        assert_eq!(h.key, "Host");
        assert_eq!(h.value, "127.0.0.1:20080");
    }

    #[test]
    fn missing_colon_is_invalid() {
        assert!(Header::parse("garbage").is_none());
    }

    #[test]
    fn round_trips_through_serialize() {
        let h = Header::new("Connection", "Keep-Alive");
        let line = h.serialize();
        let reparsed = Header::parse(line.trim_end()).unwrap();
        assert_eq!(h, reparsed);
    }
}

//! Extension-to-MIME-type lookup for static responses.

pub fn for_path(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("png") => "image/png",
        Some("jpg") => "image/jpg",
        Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn known_extensions_map_correctly() {
        assert_eq!(for_path(Path::new("index.html")), "text/html");
        assert_eq!(for_path(Path::new("a.b.JPEG")), "image/jpeg");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(for_path(Path::new("data.bin")), "application/octet-stream");
        assert_eq!(for_path(Path::new("noext")), "application/octet-stream");
    }
}

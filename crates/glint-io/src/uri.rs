//! URI resolution and inline `data:` URI decoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use glint_core::status::{GltfError, Result};

/// Resolves `url` against the base `path`.
///
/// Absolute `http(s)://` and protocol-relative `//` URLs, `data:` URIs and
/// `blob:` URLs are returned unchanged; anything else is treated as relative
/// and prefixed with `path`. An empty URL resolves to the empty string.
pub fn resolve_url(url: &str, path: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let lower = url.to_ascii_lowercase();
    let absolute = lower.starts_with("//")
        || lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("blob:")
        || (lower.starts_with("data:") && lower.contains(','));
    if absolute {
        url.to_string()
    } else {
        format!("{}{}", path, url)
    }
}

/// Base directory of a URL or path, including the trailing separator.
pub fn extract_url_base(url: &str) -> String {
    match url.rfind('/') {
        Some(pos) => url[..=pos].to_string(),
        None => String::new(),
    }
}

pub fn is_data_uri(uri: &str) -> bool {
    uri.get(..5)
        .map_or(false, |scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// An inline `data:[<mediatype>][;base64],<data>` URI.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

/// Decodes a `data:` URI into its media type and payload bytes.
pub fn decode_data_uri(uri: &str) -> Result<DataUri> {
    if !is_data_uri(uri) {
        return Err(GltfError::InvalidDataUri("missing data: scheme".into()));
    }
    let comma_pos = uri
        .find(',')
        .ok_or_else(|| GltfError::InvalidDataUri("no comma".into()))?;

    let header = &uri[5..comma_pos];
    let payload = &uri[comma_pos + 1..];

    let mut params = header.split(';');
    let mime_type = params
        .next()
        .filter(|mime| !mime.is_empty())
        .map(str::to_string);
    let is_base64 = params.any(|param| param.eq_ignore_ascii_case("base64"));

    let data = if is_base64 {
        let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD
            .decode(cleaned)
            .map_err(|e| GltfError::InvalidDataUri(e.to_string()))?
    } else {
        percent_decode(payload)
    };

    Ok(DataUri { mime_type, data })
}

/// Decodes `%XX` escapes. Malformed escapes are kept literally.
pub fn percent_decode(input: &str) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                output.push((h << 4) | l);
                i += 3;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }

    output
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url("buffer.bin", "models/"), "models/buffer.bin");
        assert_eq!(resolve_url("https://cdn.example/a.bin", "models/"), "https://cdn.example/a.bin");
        assert_eq!(resolve_url("//cdn.example/a.bin", "models/"), "//cdn.example/a.bin");
        assert_eq!(resolve_url("data:,abc", "models/"), "data:,abc");
        assert_eq!(resolve_url("blob:xyz", "models/"), "blob:xyz");
        assert_eq!(resolve_url("", "models/"), "");
    }

    #[test]
    fn test_extract_url_base() {
        assert_eq!(extract_url_base("assets/models/duck.glb"), "assets/models/");
        assert_eq!(extract_url_base("duck.glb"), "");
    }

    #[test]
    fn test_base64_data_uri() {
        let uri = decode_data_uri("data:application/octet-stream;base64,SGVsbG8=").unwrap();
        assert_eq!(uri.data, b"Hello");
        assert_eq!(uri.mime_type.as_deref(), Some("application/octet-stream"));
    }

    #[test]
    fn test_percent_data_uri() {
        let uri = decode_data_uri("data:,Hello%20World").unwrap();
        assert_eq!(uri.data, b"Hello World");
        assert_eq!(uri.mime_type, None);
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(decode_data_uri("data:application/octet-stream;base64").is_err());
        assert!(decode_data_uri("data:;base64,@@@@").is_err());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("Hello%20World"), b"Hello World");
        assert_eq!(percent_decode("%2F"), b"/");
        assert_eq!(percent_decode("100%"), b"100%");
        assert_eq!(percent_decode("%zz"), b"%zz");
    }
}

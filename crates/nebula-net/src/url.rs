//! Percent-encoding of request URLs.

const PASSTHROUGH: &[u8] = b"/:~-._";

/// Percent-encode `url` for the wire.
///
/// ASCII alphanumerics and `/ : ~ - . _` are kept, well-formed `%XX` escapes
/// are preserved as-is, and every other byte becomes `%XX`.
pub fn encode_url(url: &str) -> String {
    let bytes = url.as_bytes();
    let mut encoded = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'%'
            && let Some(escape) = bytes.get(i + 1..i + 3)
            && escape.iter().all(u8::is_ascii_hexdigit)
        {
            encoded.push('%');
            encoded.push(escape[0] as char);
            encoded.push(escape[1] as char);
            i += 3;
            continue;
        }
        if byte.is_ascii_alphanumeric() || PASSTHROUGH.contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
        i += 1;
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_url_is_unchanged() {
        let url = "https://assets.example.com:8443/models/ship_01.glb";
        assert_eq!(encode_url(url), url);
    }

    #[test]
    fn test_reserved_bytes_are_escaped() {
        assert_eq!(encode_url("http://h/a b?x=1&y"), "http://h/a%20b%3Fx%3D1%26y");
    }

    #[test]
    fn test_existing_escapes_are_kept() {
        assert_eq!(encode_url("http://h/a%20b"), "http://h/a%20b");
        assert_eq!(encode_url("http://h/100%"), "http://h/100%25");
        assert_eq!(encode_url("http://h/%zz"), "http://h/%25zz");
    }

    #[test]
    fn test_non_ascii_is_escaped_per_byte() {
        assert_eq!(encode_url("/é"), "/%C3%A9");
    }
}

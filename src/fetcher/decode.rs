use std::sync::LazyLock;

use bytes::Bytes;
use encoding_rs::Encoding;
use regex::Regex;

use crate::fetcher::{errors::FetchError, types::Charset};

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

/// Decode a fetched body to UTF-8, sniffing the charset from the
/// Content-Type header, the document's meta tags, or byte heuristics, in
/// that order.
pub fn decode_body(content_type: &str, body_bytes: &Bytes) -> Result<(String, Charset), FetchError> {
    let charset = detect_charset(content_type, body_bytes);
    let text = decode_to_utf8(body_bytes, &charset)?;
    Ok((text, charset))
}

fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    // 1. Check Content-Type header for charset
    if let Some(captures) = CHARSET_REGEX.captures(content_type)
        && let Some(charset_str) = captures.get(1)
    {
        let charset_name = charset_str.as_str().to_lowercase();
        if let Some(encoding) = Encoding::for_label(charset_name.as_bytes()) {
            return Charset::from_encoding(encoding);
        }
    }

    // 2. Check for <meta charset> in the first 4KB
    let search_bytes = &body_bytes[..body_bytes.len().min(4096)];
    let search_str = String::from_utf8_lossy(search_bytes);

    if let Some(captures) = META_CHARSET_REGEX.captures(&search_str)
        && let Some(charset_str) = captures.get(1)
    {
        let charset_name = charset_str.as_str().to_lowercase();
        if let Some(encoding) = Encoding::for_label(charset_name.as_bytes()) {
            return Charset::from_encoding(encoding);
        }
    }

    if let Some(captures) = META_HTTP_EQUIV_REGEX.captures(&search_str)
        && let Some(charset_str) = captures.get(1)
    {
        let charset_name = charset_str.as_str().to_lowercase();
        if let Some(encoding) = Encoding::for_label(charset_name.as_bytes()) {
            return Charset::from_encoding(encoding);
        }
    }

    // 3. Fall back to heuristic detection
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(search_bytes, false);
    let detected = detector.guess(None, true);

    Charset::from_encoding(detected)
}

fn decode_to_utf8(body_bytes: &[u8], charset: &Charset) -> Result<String, FetchError> {
    let encoding = match charset {
        Charset::Utf8 => encoding_rs::UTF_8,
        Charset::Latin1 | Charset::Iso88591 => encoding_rs::WINDOWS_1252,
        Charset::Windows1252 => encoding_rs::WINDOWS_1252,
        Charset::ShiftJis => encoding_rs::SHIFT_JIS,
        Charset::Gb2312 => encoding_rs::GBK,
        Charset::Big5 => encoding_rs::BIG5,
        Charset::Other(name) => Encoding::for_label(name.as_bytes()).unwrap_or(encoding_rs::UTF_8),
    };

    let (decoded, _encoding, had_errors) = encoding.decode(body_bytes);

    if had_errors {
        return Err(FetchError::Charset(format!(
            "failed to decode content with encoding: {}",
            encoding.name()
        )));
    }

    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_charset_from_content_type() {
        let content_type = "text/html; charset=utf-8";
        let body = b"<html><head><title>Test</title></head></html>";

        let charset = detect_charset(content_type, body);
        assert!(matches!(charset, Charset::Utf8));
    }

    #[test]
    fn test_detect_charset_from_meta_tag() {
        let content_type = "text/html";
        let body = b"<html><head><meta charset=\"iso-8859-1\"><title>Test</title></head></html>";

        let charset = detect_charset(content_type, body);
        // ISO-8859-1 gets mapped to Windows1252 by encoding_rs since it's a superset
        assert!(matches!(charset, Charset::Windows1252));
    }

    #[test]
    fn test_detect_charset_from_meta_http_equiv() {
        let content_type = "text/html";
        let body = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\"><title>Test</title></head></html>";

        let charset = detect_charset(content_type, body);
        assert!(matches!(charset, Charset::Windows1252));
    }

    #[test]
    fn test_decode_utf8_body() {
        let body = Bytes::from_static("Price: 450 €, 3 nights".as_bytes());
        let (text, charset) = decode_body("text/html; charset=utf-8", &body).unwrap();
        assert_eq!(text, "Price: 450 €, 3 nights");
        assert!(matches!(charset, Charset::Utf8));
    }

    #[test]
    fn test_decode_windows_1252_price_symbols() {
        // 0x80 is the euro sign in windows-1252 and invalid UTF-8
        let mut raw = b"<html><body>Total: ".to_vec();
        raw.push(0x80);
        raw.extend_from_slice(b"1,299</body></html>");
        let body = Bytes::from(raw);

        let (text, charset) = decode_body("text/html; charset=windows-1252", &body).unwrap();
        assert!(text.contains("€1,299"));
        assert!(matches!(charset, Charset::Windows1252));
    }
}

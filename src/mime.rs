//! Content-type selection for uploaded objects.

use std::path::Path;

/// Bytes considered when sniffing a content type.
pub const SNIFF_LEN: usize = 512;

pub const HTML_CONTENT_TYPE: &str = "text/html";
pub const APK_CONTENT_TYPE: &str = "application/vnd.android.package-archive";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Pick the content type for an object.
///
/// The sniffed type of `prefix` is overridden when the source path merely
/// *contains* "html" or "apk" anywhere, so `/tmp/htmlreport.txt` becomes
/// `text/html`. The "apk" rule is checked last and wins.
pub fn content_type_for(source_path: &Path, prefix: &[u8]) -> &'static str {
    let path = source_path.to_string_lossy();
    let mut content_type = sniff_content_type(prefix);
    if path.contains("html") {
        content_type = HTML_CONTENT_TYPE;
    }
    if path.contains("apk") {
        content_type = APK_CONTENT_TYPE;
    }
    content_type
}

/// Classify data by its leading bytes, in the manner of the WHATWG
/// MIME sniffing algorithm. Only the first [`SNIFF_LEN`] bytes are used.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    let data = &bytes[..bytes.len().min(SNIFF_LEN)];

    if let Some(content_type) = sniff_markup(data) {
        return content_type;
    }

    match data {
        [b'%', b'P', b'D', b'F', b'-', ..] => "application/pdf",
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', b'V', b'P', ..] => {
            "image/webp"
        }
        [b'B', b'M', ..] => "image/bmp",
        [0x00, 0x00, 0x01, 0x00, ..] | [0x00, 0x00, 0x02, 0x00, ..] => "image/x-icon",
        [b'P', b'K', 0x03, 0x04, ..] => "application/zip",
        [0x1F, 0x8B, 0x08, ..] => "application/x-gzip",
        [0xEF, 0xBB, 0xBF, ..] => TEXT_PLAIN,
        _ if looks_binary(data) => OCTET_STREAM,
        _ => TEXT_PLAIN,
    }
}

fn sniff_markup(data: &[u8]) -> Option<&'static str> {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))?;
    let data = &data[start..];

    const HTML_TAGS: &[&[u8]] = &[
        b"<!DOCTYPE HTML",
        b"<HTML",
        b"<HEAD",
        b"<SCRIPT",
        b"<IFRAME",
        b"<H1",
        b"<DIV",
        b"<FONT",
        b"<TABLE",
        b"<A",
        b"<STYLE",
        b"<TITLE",
        b"<B",
        b"<BODY",
        b"<BR",
        b"<P",
        b"<!--",
    ];

    for tag in HTML_TAGS {
        if starts_with_tag(data, tag) {
            return Some("text/html; charset=utf-8");
        }
    }

    if data.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }

    None
}

/// Case-insensitive tag match that must be terminated by a space or `>`.
fn starts_with_tag(data: &[u8], tag: &[u8]) -> bool {
    if data.len() < tag.len() + 1 {
        return false;
    }
    let matches = data
        .iter()
        .zip(tag)
        .all(|(d, t)| d.to_ascii_uppercase() == *t);
    matches && matches!(data[tag.len()], b' ' | b'>')
}

fn looks_binary(data: &[u8]) -> bool {
    data.iter()
        .any(|b| matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_substring_overrides_sniffing() {
        assert_eq!(
            content_type_for(Path::new("assets/android/index.html"), b"plain words"),
            "text/html"
        );
    }

    #[test]
    fn test_html_substring_anywhere_in_path() {
        assert_eq!(
            content_type_for(Path::new("/tmp/htmlreport.txt"), b"plain words"),
            "text/html"
        );
    }

    #[test]
    fn test_apk_substring_overrides_zip_magic() {
        assert_eq!(
            content_type_for(Path::new("/tmp/build.apk"), b"PK\x03\x04rest"),
            APK_CONTENT_TYPE
        );
    }

    #[test]
    fn test_apk_wins_over_html() {
        assert_eq!(
            content_type_for(Path::new("/apk/index.html"), b"<html>"),
            APK_CONTENT_TYPE
        );
    }

    #[test]
    fn test_falls_back_to_sniffed_type() {
        assert_eq!(
            content_type_for(
                Path::new("assets/ios/appicon.png"),
                &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]
            ),
            "image/png"
        );
        assert_eq!(
            content_type_for(Path::new("assets/ios/version.json"), b"{\"version\":\"1\"}"),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_sniff_ipa_as_zip() {
        assert_eq!(sniff_content_type(b"PK\x03\x04\x14\x00"), "application/zip");
    }

    #[test]
    fn test_sniff_xml_plist() {
        assert_eq!(
            sniff_content_type(b"\n  <?xml version=\"1.0\" encoding=\"UTF-8\"?>"),
            "text/xml; charset=utf-8"
        );
    }

    #[test]
    fn test_sniff_html_tag_case_insensitive() {
        assert_eq!(
            sniff_content_type(b"<!doctype html>\n<html>"),
            "text/html; charset=utf-8"
        );
        assert_eq!(sniff_content_type(b"<body>"), "text/html; charset=utf-8");
    }

    #[test]
    fn test_sniff_images() {
        assert_eq!(sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_content_type(b"GIF89a...."), "image/gif");
        assert_eq!(sniff_content_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_sniff_binary_and_empty() {
        assert_eq!(
            sniff_content_type(&[0x00, 0x01, 0x02, 0x03]),
            "application/octet-stream"
        );
        assert_eq!(sniff_content_type(&[]), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_sniff_only_uses_bounded_prefix() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(sniff_content_type(&data), "text/plain; charset=utf-8");
    }
}

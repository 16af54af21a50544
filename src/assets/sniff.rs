//! Content-based MIME detection.
//!
//! Binary formats are recognised by their magic numbers via [`infer`]. SVG
//! has no magic number and is detected from its root element before `infer`
//! gets a chance to label it generic XML. Anything left is classified as
//! plain text or opaque binary.
//!
//! `infer` labels fonts with the legacy `application/font-*` types. Those are
//! reported as the registered `font/*` types instead.

const OCTET_STREAM: &str = "application/octet-stream";
const EMPTY: &str = "application/x-empty";
const SVG: &str = "image/svg+xml";
const TEXT: &str = "text/plain";

/// Leading bytes inspected when looking for an SVG root element.
const SVG_PROBE_LEN: usize = 1024;

/// Returns the MIME type of `content` judged from the bytes alone.
pub fn sniff(content: &[u8]) -> &'static str {
    if content.is_empty() {
        return EMPTY;
    }
    if looks_like_svg(content) {
        return SVG;
    }
    if let Some(kind) = infer::get(content) {
        return font_type(&kind).unwrap_or(kind.mime_type());
    }
    if is_text(content) { TEXT } else { OCTET_STREAM }
}

fn looks_like_svg(content: &[u8]) -> bool {
    let probe = &content[..content.len().min(SVG_PROBE_LEN)];
    let text = String::from_utf8_lossy(probe);
    let head = text.trim_start_matches('\u{feff}').trim_start();

    if head.starts_with("<svg") {
        return true;
    }
    (head.starts_with("<?xml") || head.starts_with("<!DOCTYPE svg")) && head.contains("<svg")
}

fn font_type(kind: &infer::Type) -> Option<&'static str> {
    if kind.matcher_type() != infer::MatcherType::Font {
        return None;
    }
    match kind.extension() {
        "woff" => Some("font/woff"),
        "woff2" => Some("font/woff2"),
        "ttf" => Some("font/ttf"),
        "otf" => Some("font/otf"),
        _ => None,
    }
}

fn is_text(content: &[u8]) -> bool {
    std::str::from_utf8(content).is_ok_and(|text| !text.contains('\0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content() {
        assert_eq!(sniff(b""), "application/x-empty");
    }

    #[test]
    fn png_and_gif_magic() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(sniff(b"GIF89a\x01\0\x01\0\0\0\0"), "image/gif");
    }

    #[test]
    fn jpeg_magic() {
        assert_eq!(sniff(b"\xFF\xD8\xFF\xE0\0\x10JFIF\0"), "image/jpeg");
    }

    #[test]
    fn font_magic() {
        assert_eq!(sniff(b"wOFF\0\x01\0\0\0\0\x04\x48"), "font/woff");
        assert_eq!(sniff(b"wOF2\0\x01\0\0\0\0\x02\x10"), "font/woff2");
        assert_eq!(sniff(b"\0\x01\0\0\0\x0f\0\x80"), "font/ttf");
    }

    #[test]
    fn svg_without_prolog() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"/>"#;
        assert_eq!(sniff(svg), "image/svg+xml");
    }

    #[test]
    fn svg_with_xml_prolog() {
        let svg = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>";
        assert_eq!(sniff(svg), "image/svg+xml");
    }

    #[test]
    fn plain_text_fallback() {
        assert_eq!(sniff(b"body { color: red; }\n"), "text/plain");
    }

    #[test]
    fn unknown_binary_fallback() {
        assert_eq!(sniff(&[0x00, 0x9f, 0x92, 0x96, 0x01]), "application/octet-stream");
    }
}

//! Source format detection.

/// Number of leading bytes inspected for an inline `<svg` tag.
pub const SNIFF_LEN: usize = 100;

/// Decoder family for an input image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Vector,
    Raster,
}

/// Decide between the vector and raster branches.
///
/// A declared content type mentioning `svg` wins. Otherwise the first
/// [`SNIFF_LEN`] bytes are searched for `<svg`, case-insensitively, which
/// catches SVG served as `text/plain` or `application/octet-stream`.
pub fn detect_format(content_type: &str, bytes: &[u8]) -> SourceFormat {
    if content_type.to_ascii_lowercase().contains("svg") {
        return SourceFormat::Vector;
    }

    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    if head.windows(4).any(|w| w.eq_ignore_ascii_case(b"<svg")) {
        SourceFormat::Vector
    } else {
        SourceFormat::Raster
    }
}

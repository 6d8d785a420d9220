//! Decode, resize and encode stages plus the [`transcode`] driver.
//!
//! Every stage returns a [`Stage`] value. The driver continues on
//! [`Stage::Continue`] and returns the untouched input on
//! [`Stage::Passthrough`], so callers always receive servable bytes.

use std::fmt;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use resvg::{tiny_skia, usvg};

use crate::detect::{detect_format, SourceFormat};
use crate::sizing::target_dimensions;
use crate::{JPEG_CONTENT_TYPE, JPEG_QUALITY};

/// Canvas used when an SVG declares no usable size.
pub const SVG_FALLBACK_SIZE: (u32, u32) = (800, 600);

/// Largest side an SVG is rasterized at before resizing.
pub const MAX_RASTER_SIDE: u32 = 4096;

/// Raw bytes fetched from the origin plus their declared content type.
#[derive(Debug, Clone)]
pub struct TranscodeInput {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Why the pipeline returned the input unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassthroughReason {
    /// Zero-length input.
    Empty,
    /// The SVG document could not be parsed.
    SvgParse(String),
    /// The SVG parsed but could not be rasterized.
    SvgRender,
    /// The raster bytes could not be decoded.
    Decode(String),
    /// A raster image already within bounds.
    AlreadyCompliant,
    /// JPEG encoding failed.
    Encode(String),
    /// The transcode never ran to completion (panicked or was cancelled).
    Aborted,
}

impl fmt::Display for PassthroughReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassthroughReason::Empty => f.write_str("empty input"),
            PassthroughReason::SvgParse(e) => write!(f, "svg parse failed: {e}"),
            PassthroughReason::SvgRender => f.write_str("svg rasterization failed"),
            PassthroughReason::Decode(e) => write!(f, "decode failed: {e}"),
            PassthroughReason::AlreadyCompliant => f.write_str("already within bounds"),
            PassthroughReason::Encode(e) => write!(f, "jpeg encode failed: {e}"),
            PassthroughReason::Aborted => f.write_str("transcode aborted"),
        }
    }
}

impl PassthroughReason {
    /// Metric label for this reason.
    pub fn label(&self) -> &'static str {
        match self {
            PassthroughReason::Empty => "empty",
            PassthroughReason::SvgParse(_) => "svg_parse",
            PassthroughReason::SvgRender => "svg_render",
            PassthroughReason::Decode(_) => "decode",
            PassthroughReason::AlreadyCompliant => "compliant",
            PassthroughReason::Encode(_) => "encode",
            PassthroughReason::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Transcoded,
    Passthrough(PassthroughReason),
}

/// Result of a [`transcode`] call. Always servable.
#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    pub bytes: Bytes,
    pub content_type: String,
    /// Output size, when known.
    pub dimensions: Option<Dimensions>,
    pub outcome: Outcome,
}

impl TranscodeOutput {
    /// Hand the input back unchanged.
    pub fn passthrough(
        input: TranscodeInput,
        reason: PassthroughReason,
        dimensions: Option<Dimensions>,
    ) -> Self {
        Self {
            bytes: input.bytes,
            content_type: input.content_type,
            dimensions,
            outcome: Outcome::Passthrough(reason),
        }
    }

    pub fn is_transcoded(&self) -> bool {
        self.outcome == Outcome::Transcoded
    }

    /// Metric label for the outcome.
    pub fn label(&self) -> &'static str {
        match &self.outcome {
            Outcome::Transcoded => "transcoded",
            Outcome::Passthrough(reason) => reason.label(),
        }
    }
}

/// Outcome of a single pipeline stage.
#[derive(Debug)]
pub enum Stage<T> {
    Continue(T),
    Passthrough(PassthroughReason),
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Normalize an image to a bounded JPEG, or return it unchanged.
///
/// Raster images already within bounds keep their original bytes and content
/// type. SVG input is always rasterized and re-encoded.
pub fn transcode(input: TranscodeInput) -> TranscodeOutput {
    if input.bytes.is_empty() {
        return finish_passthrough(input, PassthroughReason::Empty, None);
    }

    let format = detect_format(&input.content_type, &input.bytes);
    let decoded = match format {
        SourceFormat::Vector => rasterize_svg(&input.bytes),
        SourceFormat::Raster => decode_raster(&input.bytes),
    };
    let source = match decoded {
        Stage::Continue(image) => image,
        Stage::Passthrough(reason) => return finish_passthrough(input, reason, None),
    };

    let (width, height) = (source.width(), source.height());
    let (target_w, target_h) = target_dimensions(width, height);

    if format == SourceFormat::Raster && (target_w, target_h) == (width, height) {
        let dims = Dimensions { width, height };
        return finish_passthrough(input, PassthroughReason::AlreadyCompliant, Some(dims));
    }

    let resized = resize(source, target_w, target_h);
    match encode_jpeg(&resized) {
        Stage::Continue(jpeg) => {
            tracing::debug!(
                source_width = width,
                source_height = height,
                width = target_w,
                height = target_h,
                bytes = jpeg.len(),
                "Image transcoded"
            );
            TranscodeOutput {
                bytes: Bytes::from(jpeg),
                content_type: JPEG_CONTENT_TYPE.to_string(),
                dimensions: Some(Dimensions {
                    width: target_w,
                    height: target_h,
                }),
                outcome: Outcome::Transcoded,
            }
        }
        Stage::Passthrough(reason) => finish_passthrough(input, reason, None),
    }
}

fn finish_passthrough(
    input: TranscodeInput,
    reason: PassthroughReason,
    dimensions: Option<Dimensions>,
) -> TranscodeOutput {
    tracing::debug!(reason = %reason, content_type = %input.content_type, "Image passed through");
    TranscodeOutput::passthrough(input, reason, dimensions)
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Decode raster bytes, sniffing the format from the content.
pub fn decode_raster(bytes: &[u8]) -> Stage<DynamicImage> {
    match image::load_from_memory(bytes) {
        Ok(image) => Stage::Continue(image),
        Err(e) => Stage::Passthrough(PassthroughReason::Decode(e.to_string())),
    }
}

/// Parse and rasterize an SVG document at its declared size.
///
/// Documents without a size render on the 800x600 fallback canvas, and so do
/// documents whose root declares a zero or negative width or height.
pub fn rasterize_svg(bytes: &[u8]) -> Stage<DynamicImage> {
    let tree = match parse_svg(bytes) {
        Ok(tree) => tree,
        Err(e) => return Stage::Passthrough(PassthroughReason::SvgParse(e.to_string())),
    };

    let size = tree.size();
    let canvas = svg_canvas(size.width(), size.height());

    let Some(mut pixmap) = tiny_skia::Pixmap::new(canvas.width, canvas.height) else {
        return Stage::Passthrough(PassthroughReason::SvgRender);
    };
    let transform = tiny_skia::Transform::from_scale(canvas.scale_x, canvas.scale_y);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied RGBA.
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    match RgbaImage::from_raw(canvas.width, canvas.height, rgba) {
        Some(buffer) => Stage::Continue(DynamicImage::ImageRgba8(buffer)),
        None => Stage::Passthrough(PassthroughReason::SvgRender),
    }
}

fn svg_options() -> usvg::Options<'static> {
    let mut options = usvg::Options::default();
    let (width, height) = SVG_FALLBACK_SIZE;
    if let Some(size) = usvg::Size::from_wh(width as f32, height as f32) {
        options.default_size = size;
    }
    options
}

fn parse_svg(bytes: &[u8]) -> Result<usvg::Tree, usvg::Error> {
    let options = svg_options();
    match usvg::Tree::from_data(bytes, &options) {
        Err(usvg::Error::InvalidSize) => {
            let Some(resized) = with_fallback_root_size(bytes) else {
                return Err(usvg::Error::InvalidSize);
            };
            tracing::debug!("SVG root has unusable bounds; using fallback canvas");
            usvg::Tree::from_data(&resized, &options)
        }
        result => result,
    }
}

/// Rewrite the root `<svg>` tag with the fallback width and height.
///
/// Returns `None` when no root tag can be located.
fn with_fallback_root_size(bytes: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(bytes).ok()?;
    let start = root_svg_tag(text)?;
    let attrs_start = start + "<svg".len();
    let attrs_end = attrs_start + tag_end(&text[attrs_start..])?;

    let (width, height) = SVG_FALLBACK_SIZE;
    let mut out = String::with_capacity(text.len() + 32);
    out.push_str(&text[..attrs_start]);
    out.push_str(&format!(r#" width="{width}" height="{height}""#));
    for (name, raw) in tag_attributes(&text[attrs_start..attrs_end]) {
        if name != "width" && name != "height" {
            out.push(' ');
            out.push_str(raw);
        }
    }
    out.push_str(&text[attrs_end..]);
    Some(out.into_bytes())
}

/// Byte offset of the first `<svg` element start tag.
fn root_svg_tag(text: &str) -> Option<usize> {
    text.match_indices("<svg").map(|(i, _)| i).find(|&i| {
        matches!(
            text.as_bytes().get(i + 4),
            Some(b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/')
        )
    })
}

/// Offset of the end of a tag's attribute list (`>` or `/>`), skipping quoted values.
fn tag_end(rest: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in rest.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => {
                return Some(if rest[..i].ends_with('/') { i - 1 } else { i });
            }
            (None, _) => {}
        }
    }
    None
}

/// Split an attribute list into `(name, raw attribute text)` pairs.
fn tag_attributes(attrs: &str) -> Vec<(&str, &str)> {
    let bytes = attrs.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name_end = i;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if let Some(&q @ (b'"' | b'\'')) = bytes.get(i) {
                i += 1;
                while i < bytes.len() && bytes[i] != q {
                    i += 1;
                }
                i = (i + 1).min(bytes.len());
            } else {
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
            }
        }
        if name_end > start {
            out.push((&attrs[start..name_end], &attrs[start..i]));
        }
    }

    out
}

/// Resize with Lanczos3; a no-op when the size already matches.
pub fn resize(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image;
    }
    image.resize_exact(width, height, FilterType::Lanczos3)
}

/// Encode as baseline JPEG. Alpha is discarded.
pub fn encode_jpeg(image: &DynamicImage) -> Stage<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    match encoder.encode_image(&rgb) {
        Ok(()) => Stage::Continue(buf),
        Err(e) => Stage::Passthrough(PassthroughReason::Encode(e.to_string())),
    }
}

/// Pixel canvas and scale for rasterizing an SVG of the given declared size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SvgCanvas {
    width: u32,
    height: u32,
    scale_x: f32,
    scale_y: f32,
}

fn svg_canvas(width: f32, height: f32) -> SvgCanvas {
    let usable = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
    if !usable {
        return SvgCanvas {
            width: SVG_FALLBACK_SIZE.0,
            height: SVG_FALLBACK_SIZE.1,
            scale_x: 1.0,
            scale_y: 1.0,
        };
    }

    let longest = width.max(height);
    let limit = MAX_RASTER_SIDE as f32;
    let factor = if longest > limit { limit / longest } else { 1.0 };

    let px_w = ((width * factor).round() as u32).clamp(1, MAX_RASTER_SIDE);
    let px_h = ((height * factor).round() as u32).clamp(1, MAX_RASTER_SIDE);

    SvgCanvas {
        width: px_w,
        height: px_h,
        scale_x: px_w as f32 / width,
        scale_y: px_h as f32 / height,
    }
}

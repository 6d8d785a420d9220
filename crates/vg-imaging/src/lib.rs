//! vg-imaging: poster and portrait normalization.
//!
//! Turns whatever the origin serves (SVG, PNG, JPEG, WebP, ...) into a JPEG
//! bounded by an orientation-dependent box. The pipeline is fail-open: any
//! stage that cannot proceed hands the original bytes back unchanged.
//!
//! - [`detect`]: vector vs. raster sniffing
//! - [`sizing`]: the orientation policy
//! - [`pipeline`]: decode, resize and encode stages plus the driver

pub mod detect;
pub mod pipeline;
pub mod sizing;

pub use detect::{detect_format, SourceFormat};
pub use pipeline::{transcode, Dimensions, Outcome, PassthroughReason, TranscodeInput, TranscodeOutput};
pub use sizing::{target_dimensions, MAX_HEIGHT, MAX_WIDTH};

/// JPEG quality used for every re-encoded image.
pub const JPEG_QUALITY: u8 = 90;

/// Content type of re-encoded output.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

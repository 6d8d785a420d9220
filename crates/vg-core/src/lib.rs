//! vg-core: shared types, errors, configuration, and request intent.
//!
//! This crate is the foundational dependency for the other vg-* crates,
//! providing the unified error type, the gateway configuration, validated
//! media identifiers, and the pure intent/range classification that decides
//! how a media request is forwarded to the origin.

pub mod config;
pub mod error;
pub mod ids;
pub mod intent;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::MediaId;
pub use intent::{Endpoint, Intent, MediaRequest, RangePolicy};

//! Validated media identifiers.
//!
//! Identifiers arrive as path segments and are spliced into origin URLs, so
//! they are restricted to a conservative character set before use.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Longest identifier accepted from a client.
pub const MAX_MEDIA_ID_LEN: usize = 128;

/// Identifier of a scene, performer or studio on the origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaId(String);

impl MediaId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MediaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for MediaId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::Validation("media id is empty".into()));
        }
        if s.len() > MAX_MEDIA_ID_LEN {
            return Err(Error::Validation(format!(
                "media id exceeds {MAX_MEDIA_ID_LEN} characters"
            )));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(Error::Validation(format!("invalid media id: {s}")));
        }
        Ok(Self(s.to_string()))
    }
}

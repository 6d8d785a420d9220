//! HTTP middleware and extractors: request ID and client authentication.

pub mod auth;
pub mod request_id;

//! Client authentication.
//!
//! Gated handlers take an [`Authorized`] parameter. Extraction reads a token
//! from `Authorization: Bearer`, the `auth_token` cookie, or the `auth_token`
//! query parameter, in that order, and asks the context's [`AuthValidator`]
//! whether it is acceptable. When auth is disabled every request passes.

use std::collections::HashSet;

use axum::extract::{FromRequestParts, Query};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use serde::Deserialize;

use vg_core::config::AuthConfig;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Cookie and query parameter carrying a client token.
pub const TOKEN_PARAM: &str = "auth_token";

/// Decides whether a client token grants access.
pub trait AuthValidator: Send + Sync {
    fn validate(&self, token: &str) -> bool;
}

/// Accepts a fixed set of tokens from configuration.
#[derive(Debug, Default)]
pub struct StaticTokens {
    tokens: HashSet<String>,
}

impl StaticTokens {
    pub fn from_config(config: &AuthConfig) -> Self {
        let tokens = config
            .api_key
            .iter()
            .chain(config.tokens.iter())
            .filter(|t| !t.is_empty())
            .cloned()
            .collect();
        Self { tokens }
    }
}

impl AuthValidator for StaticTokens {
    fn validate(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

/// Proof that a request passed the auth gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorized {
    /// Auth is disabled in configuration.
    Open,
    /// A valid token was presented.
    Token,
}

impl FromRequestParts<AppContext> for Authorized {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppContext) -> Result<Self, Self::Rejection> {
        if !ctx.config.auth.enabled {
            return Ok(Authorized::Open);
        }

        let authorized = request_tokens(parts)
            .iter()
            .any(|token| ctx.auth.validate(token));
        if authorized {
            return Ok(Authorized::Token);
        }

        tracing::debug!(path = %parts.uri.path(), "Rejected request without a valid token");
        let err = AppError::new(vg_core::Error::Unauthorized("missing or invalid token".into()));
        Err(match parts.extensions.get::<RequestId>() {
            Some(id) => err.with_request_id(id.0.clone()),
            None => err,
        })
    }
}

/// Query string carrying a client token; values arrive percent-decoded.
#[derive(Debug, Deserialize)]
struct TokenQuery {
    auth_token: Option<String>,
}

/// Collect candidate tokens in resolution order.
fn request_tokens(parts: &Parts) -> Vec<String> {
    let mut tokens = Vec::new();

    if let Some(value) = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            tokens.push(token.trim().to_string());
        }
    }

    for value in parts.headers.get_all(COOKIE) {
        let Ok(cookies) = value.to_str() else { continue };
        for part in cookies.split(';') {
            if let Some(token) = part.trim().strip_prefix(TOKEN_PARAM).and_then(|rest| rest.strip_prefix('=')) {
                tokens.push(token.to_string());
            }
        }
    }

    if let Ok(Query(TokenQuery { auth_token: Some(token) })) = Query::try_from_uri(&parts.uri) {
        tokens.push(token);
    }

    tokens
}

//! Authentication and token resolution for waybill.
//!
//! The lookup gateway requires a bearer token scoped to the logged-in
//! session. This crate resolves that token from two sources:
//! - The `WAYBILL_API_TOKEN` environment variable (operator override)
//! - The session user profile
//!
//! # Example
//!
//! ```
//! use waybill_auth::resolve_token;
//! use waybill_types::UserProfile;
//!
//! let profile = UserProfile {
//!     id: "u1".to_string(),
//!     token: Some("secret-token".to_string()),
//!     ..Default::default()
//! };
//!
//! let auth = resolve_token(Some(&profile));
//! assert!(auth.detected);
//! ```

use std::env;

use waybill_types::UserProfile;

/// Environment variable overriding the session token
pub const WAYBILL_API_TOKEN_ENV: &str = "WAYBILL_API_TOKEN";

/// Authentication information
#[derive(Debug, Clone, Default)]
pub struct AuthInfo {
    /// The resolved token (if found)
    pub token: Option<String>,
    /// Source of the token
    pub source: TokenSource,
    /// Whether a usable token was detected
    pub detected: bool,
}

/// Source of the authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenSource {
    /// No token found
    #[default]
    None,
    /// From the `WAYBILL_API_TOKEN` environment variable
    Env,
    /// From the session user profile
    Profile,
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::None => write!(f, "none"),
            TokenSource::Env => write!(f, "WAYBILL_API_TOKEN"),
            TokenSource::Profile => write!(f, "session profile"),
        }
    }
}

/// Resolve the bearer token for the lookup gateway.
///
/// Checks in order:
/// 1. `WAYBILL_API_TOKEN` environment variable
/// 2. The session profile's `token` field
pub fn resolve_token(profile: Option<&UserProfile>) -> AuthInfo {
    if let Ok(token) = env::var(WAYBILL_API_TOKEN_ENV) {
        if !token.is_empty() {
            return AuthInfo {
                token: Some(token),
                source: TokenSource::Env,
                detected: true,
            };
        }
    }

    if let Some(profile) = profile {
        if let Some(token) = &profile.token {
            if !token.is_empty() {
                return AuthInfo {
                    token: Some(token.clone()),
                    source: TokenSource::Profile,
                    detected: true,
                };
            }
        }
    }

    AuthInfo::default()
}

/// Check if a token is available for the session.
pub fn has_token(profile: Option<&UserProfile>) -> bool {
    resolve_token(profile).detected
}

/// Mask a token for safe display (show first 4 and last 4 chars).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 8 {
        return "*".repeat(token.len());
    }
    format!("{}****{}", &token[..4], &token[token.len() - 4..])
}

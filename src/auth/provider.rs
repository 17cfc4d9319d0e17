//! Proof that a sign-in comes from the external auth provider.
//!
//! The provider's bridge signs users in by calling `POST /api/session` with the
//! shared secret in the `X-Auth-Provider-Secret` header. An external id alone
//! proves nothing.

use actix_web::HttpRequest;

use crate::config::AppConfig;
use crate::errors::AppError;

pub const PROVIDER_SECRET_HEADER: &str = "X-Auth-Provider-Secret";

/// Accept the request only when it carries the configured provider secret.
/// With no secret configured every sign-in is refused.
pub fn verify(req: &HttpRequest, config: &AppConfig) -> Result<(), AppError> {
    let Some(expected) = config.auth_provider_secret() else {
        log::warn!("Sign-in refused: AUTH_PROVIDER_SECRET is not configured");
        return Err(AppError::Session("Sign-in is not available".to_string()));
    };

    let submitted = req
        .headers()
        .get(PROVIDER_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if submitted.is_empty() || !constant_time_eq(expected, submitted) {
        return Err(AppError::Session("Missing or invalid auth provider proof".to_string()));
    }
    Ok(())
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

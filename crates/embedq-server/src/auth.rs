//! Bearer-token extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the request carried `Authorization: Bearer <AUTH_TOKEN>`.
///
/// Add it as a handler parameter to require the shared token:
///
/// ```ignore
/// async fn my_handler(_auth: BearerAuth) -> AppResult<Json<()>> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BearerAuth;

impl FromRequestParts<AppState> for BearerAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header".into())
        })?;

        if !constant_time_eq(token.as_bytes(), state.config.auth_token.as_bytes()) {
            tracing::debug!("rejected request with invalid token");
            return Err(AppError::Unauthorized("Invalid token".into()));
        }

        Ok(BearerAuth)
    }
}

/// Runs over `presented` only, so timing depends on neither the bytes nor
/// the length of `expected`.
fn constant_time_eq(presented: &[u8], expected: &[u8]) -> bool {
    if expected.is_empty() {
        return presented.is_empty();
    }

    let mut diff = presented.len() ^ expected.len();
    for (i, byte) in presented.iter().enumerate() {
        diff |= usize::from(byte ^ expected[i % expected.len()]);
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_plain_equality() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn prefixes_and_repetitions_of_the_token_are_rejected() {
        assert!(!constant_time_eq(b"", b"secret"));
        assert!(!constant_time_eq(b"sec", b"secret"));
        assert!(!constant_time_eq(b"secretsecret", b"secret"));
    }
}

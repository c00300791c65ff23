//! Authentication extractors.
//!
//! Every core endpoint consumes a decoded principal from the request's
//! bearer token. The token is issued by the identity collaborator; this
//! server only verifies the signature and expiry, then trusts the embedded
//! identity without a database round-trip.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use resold_core::{Role, UserId};

use crate::error::AppError;
use crate::models::Principal;
use crate::state::AppState;

/// Claims carried by a marketplace bearer token.
///
/// `role` stays a raw string at this layer: the issuer also signs
/// email-verification tokens (`role = "verify"`) with the same key, and
/// those must be recognized and rejected rather than failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: i32,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Role value reserved for email-verification tokens.
const VERIFY_ROLE: &str = "verify";

/// Decode and check a bearer token, producing the request principal.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for a bad signature, expired token,
/// verification-only token, or unknown role.
pub fn decode_principal(token: &str, key: &DecodingKey) -> Result<Principal, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = jsonwebtoken::decode::<Claims>(token, key, &validation)
        .map_err(|_| AppError::Unauthorized("Malformed or invalid bearer token".to_owned()))?;

    let claims = data.claims;

    if claims.role == VERIFY_ROLE {
        return Err(AppError::Unauthorized(
            "Invalid token, not used for login".to_owned(),
        ));
    }

    let role = claims
        .role
        .parse::<Role>()
        .map_err(|_| AppError::Unauthorized("Malformed or invalid bearer token".to_owned()))?;

    Ok(Principal {
        user_id: UserId::new(claims.sub),
        firstname: claims.firstname,
        lastname: claims.lastname,
        role,
    })
}

/// Pull the token out of an `Authorization: Bearer ...` header.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("Bearer token required for authorisation".to_owned())
        })?;

    header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Bearer token required for authorisation".to_owned())
    })
}

/// Extractor that requires an authenticated principal.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(AuthUser(principal): AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", principal.full_name())
/// }
/// ```
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)?;
        let principal = decode_principal(token, state.decoding_key())?;
        Ok(Self(principal))
    }
}

/// Extractor that requires an authenticated admin.
///
/// Also writes the audit trail: every admin request is logged with the
/// acting admin's id.
pub struct RequireAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;

        if !principal.role.is_admin() {
            return Err(AppError::Forbidden);
        }

        tracing::info!(
            target: "audit",
            admin = %principal.user_id,
            method = %parts.method,
            path = %parts.uri.path(),
            "admin request"
        );

        Ok(Self(principal))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &[u8] = b"unit-test-signing-key-0123456789abcdef";

    fn mint(role: &str, exp_offset_secs: i64) -> String {
        let claims = Claims {
            sub: 42,
            firstname: "Casey".to_owned(),
            lastname: "Buyer".to_owned(),
            role: role.to_owned(),
            exp: chrono::Utc::now().timestamp() + exp_offset_secs,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn key() -> DecodingKey {
        DecodingKey::from_secret(SECRET)
    }

    #[test]
    fn decodes_a_valid_user_token() {
        let principal = decode_principal(&mint("user", 3600), &key()).unwrap();
        assert_eq!(principal.user_id, UserId::new(42));
        assert_eq!(principal.full_name(), "Casey Buyer");
        assert!(!principal.role.is_admin());
    }

    #[test]
    fn decodes_an_admin_token() {
        let principal = decode_principal(&mint("admin", 3600), &key()).unwrap();
        assert!(principal.role.is_admin());
    }

    #[test]
    fn rejects_verification_tokens() {
        let err = decode_principal(&mint("verify", 3600), &key()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg.contains("not used for login")));
    }

    #[test]
    fn rejects_expired_tokens() {
        let err = decode_principal(&mint("user", -3600), &key()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn rejects_wrong_key() {
        let other = DecodingKey::from_secret(b"a-completely-different-signing-key");
        let err = decode_principal(&mint("user", 3600), &other).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn rejects_unknown_roles() {
        let err = decode_principal(&mint("superuser", 3600), &key()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}

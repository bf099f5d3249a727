use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AppConfig, Env};
use crate::error::ApiError;

/// Claims
///
/// The payload structure expected inside an admin JSON Web Token. Tokens are
/// issued by the external identity provider and signed with the shared secret;
/// this service only validates them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the administrator's UUID at the identity provider.
    pub sub: Uuid,
    /// Role claim. Admin routes require exactly "admin".
    pub role: String,
    /// Expiration time, always validated.
    pub exp: usize,
    /// Issued-at time.
    pub iat: usize,
}

/// AdminUser
///
/// The resolved identity of an authenticated administrator request. Handlers on
/// the admin surface take this as an argument; the extractor rejects anything
/// without a valid admin token before the handler runs.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: Uuid,
}

/// AdminUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AdminUser usable as a
/// function argument in any admin handler and as the gate in the admin router's
/// middleware layer.
///
/// The process:
/// 1. Local Bypass: in `Env::Local`, the `x-admin-role: admin` header grants
///    access, which keeps local development and integration tests free of token
///    minting. Guarded by the Env check, never active in production.
/// 2. Token Validation: standard Bearer token extraction and JWT decoding with
///    expiry validation.
/// 3. Role Check: a valid token without `role == "admin"` is rejected with 403.
///
/// Rejection: 401 for missing/invalid credentials, 403 for a non-admin role.
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        // Local development bypass.
        if config.env == Env::Local {
            if let Some(role) = parts.headers.get("x-admin-role") {
                if role.to_str().is_ok_and(|r| r == "admin") {
                    return Ok(AdminUser { id: Uuid::nil() });
                }
            }
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            // Expired signature, bad signature, malformed token: all 401.
            .map_err(|_| ApiError::Unauthorized)?;

        if token_data.claims.role != "admin" {
            return Err(ApiError::Forbidden);
        }

        Ok(AdminUser {
            id: token_data.claims.sub,
        })
    }
}

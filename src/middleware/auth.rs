use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Route guard: resolves the caller and checks it against `state.role`.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;

    let principal = authenticate(&state.db, &state.keys, token).await?;

    if !principal.role.satisfies(state.role) {
        debug!(
            account_id = principal.account_id,
            role = %principal.role,
            required = %state.role,
            "Role check failed"
        );
        return Err(ApiError::Forbidden("Insufficient permissions".into()));
    }

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub role: Role,
    pub exp: usize,
}

/// The verified caller, available to handlers as a request extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    pub account_id: i32,
    pub role: Role,
}

#[derive(Clone)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub keys: Arc<TokenKeys>,
    pub role: Role,
}

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        TokenKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }
}

pub fn generate_token(keys: &TokenKeys, user_id: i32, role: Role) -> Result<String, AuthError> {
    let exp = Utc::now()
        .checked_add_signed(keys.ttl)
        .ok_or(AuthError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims { user_id, role, exp };

    encode(&Header::default(), &claims, &keys.encoding).map_err(|_| AuthError::GenerationFail)
}

/// Verifies `token` and resolves it to a still-existing account.
pub async fn authenticate(
    db: &DatabaseConnection,
    keys: &TokenKeys,
    token: &str,
) -> Result<Principal, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let claims = decode::<Claims>(token, &keys.decoding, &validation)
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::ValidationFail,
        })?
        .claims;

    let account = UserEntity::find_by_id(claims.user_id)
        .one(db)
        .await?
        .ok_or(AuthError::InvalidUserOrRole)?;

    if account.role != claims.role {
        return Err(AuthError::InvalidUserOrRole);
    }

    Ok(Principal {
        account_id: account.id,
        role: account.role,
    })
}

/// `Authorization: Bearer <token>`, falling back to an `Authorization` cookie.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        return value.strip_prefix("Bearer ").map(str::trim);
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "Authorization")
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No Authorization header or cookie provided")]
    MissingToken,
    #[error("Invalid user id or role")]
    InvalidUserOrRole,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to validate token")]
    ValidationFail,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Db(err) => ApiError::Db(err),
            AuthError::GenerationFail => ApiError::Internal(err.to_string()),
            _ => ApiError::Unauthenticated(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn rejects_header_without_bearer_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; Authorization=abc.def"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn issued_token_decodes_with_same_keys() {
        let keys = TokenKeys::new("test-secret", 1);
        let token = generate_token(&keys, 42, Role::Admin).unwrap();

        let data = decode::<Claims>(&token, &keys.decoding, &Validation::new(Algorithm::HS256))
            .unwrap();
        assert_eq!(data.claims.user_id, 42);
        assert_eq!(data.claims.role, Role::Admin);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = generate_token(&TokenKeys::new("one", 1), 1, Role::User).unwrap();
        let other = TokenKeys::new("two", 1);
        assert!(decode::<Claims>(&token, &other.decoding, &Validation::new(Algorithm::HS256)).is_err());
    }
}

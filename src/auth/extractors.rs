use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, warn};

use super::{
    jwt::{JwtKeys, TokenError},
    repo::UserStore,
    repo_types::User,
    resolver::{resolve_identity, ResolveError},
};
use crate::{error::AppError, state::AppState};

/// Why the auth gate turned a request away.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no session token presented")]
    MissingToken,
    #[error("token rejected: {0}")]
    InvalidToken(#[from] TokenError),
    #[error("token subject {0} does not exist")]
    UnknownSubject(i64),
    #[error("identity lookup failed: {0}")]
    Store(#[source] crate::error::StoreError),
}

impl From<ResolveError> for AuthError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound(id) => AuthError::UnknownSubject(id),
            ResolveError::Store(e) => AuthError::Store(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Store(e) => {
                error!(error = %e, "auth identity lookup failed");
                AppError::from(e)
            }
            other => {
                warn!(reason = %other, "request unauthenticated");
                AppError::Unauthenticated
            }
        }
    }
}

/// Pull the bearer token from `Authorization: Bearer ...`, falling back to
/// the session cookie.
pub fn token_from_headers<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(strip_bearer);
    if from_header.is_some() {
        return from_header;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| strip_bearer(value).unwrap_or(value).trim())
        .filter(|t| !t.is_empty())
}

fn strip_bearer(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extract, verify and resolve. The only path from a request to a `User`.
pub async fn authenticate(
    headers: &HeaderMap,
    cookie_name: &str,
    keys: &JwtKeys,
    users: &dyn UserStore,
    now: OffsetDateTime,
) -> Result<User, AuthError> {
    let token = token_from_headers(headers, cookie_name).ok_or(AuthError::MissingToken)?;
    let claims = keys.verify(token, now)?;
    let user = resolve_identity(users, claims.sub).await?;
    Ok(user)
}

/// The authenticated caller, established once per request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(
            &parts.headers,
            &state.config.cookie.name,
            &state.keys,
            state.users.as_ref(),
            OffsetDateTime::now_utc(),
        )
        .await?;

        let user = AuthUser(user);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

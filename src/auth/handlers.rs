use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, SignupRequest, UserResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        services::{login_user, register_user, session_cookie},
    },
    error::{AppError, JsonBody},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signup", post(signup))
        .route("/user/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/user/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = register_user(state.users.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse { user: user.into() }),
    ))
}

#[instrument(skip(state, keys, payload))]
pub async fn login(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), AppError> {
    let now = OffsetDateTime::now_utc();
    let (user, issued) = login_user(state.users.as_ref(), &keys, payload, now).await?;

    let cookie = session_cookie(&state.config.cookie, &issued, now);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(e.into()))?,
    );

    Ok((
        headers,
        Json(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user: user.into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse { user: user.into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::PublicUser;

    #[test]
    fn public_user_has_no_password_hash() {
        let response = UserResponse {
            user: PublicUser {
                id: 1,
                first_name: "A".into(),
                last_name: "B".into(),
                email: "test@example.com".into(),
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, SignupRequest},
    jwt::{IssuedToken, JwtKeys},
    password::{hash_password, verify_password},
    repo::UserStore,
    repo_types::{NewUser, User},
};
use crate::{
    config::CookieConfig,
    error::{AppError, FieldError},
};

pub const MIN_PASSWORD_CHARS: usize = 5;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_credentials(email: &str, password: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(FieldError::new("password", "must be at least 5 characters"));
    }
}

pub fn validate_signup(req: &SignupRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();
    if req.first_name.trim().is_empty() {
        errors.push(FieldError::new("first_name", "must not be empty"));
    }
    if req.last_name.trim().is_empty() {
        errors.push(FieldError::new("last_name", "must not be empty"));
    }
    check_credentials(&req.email, &req.password, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn validate_login(req: &LoginRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();
    check_credentials(&req.email, &req.password, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

async fn hash_blocking(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

async fn verify_blocking(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await?
}

/// Validate, hash and persist a new account.
pub async fn register_user(users: &dyn UserStore, req: SignupRequest) -> Result<User, AppError> {
    validate_signup(&req)?;

    let password_hash = hash_blocking(req.password).await?;
    let user = users
        .insert(NewUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password_hash,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "signup rejected by store");
            AppError::from(e)
        })?;

    info!(user_id = user.id, "user registered");
    Ok(user)
}

/// Check credentials and issue a session token. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn login_user(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
    now: OffsetDateTime,
) -> Result<(User, IssuedToken), AppError> {
    validate_login(&req)?;

    let Some(user) = users.find_by_email(&req.email).await? else {
        warn!("login unknown email");
        return Err(AppError::Unauthenticated);
    };

    if !verify_blocking(req.password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::Unauthenticated);
    }

    let issued = keys
        .issue(user.id, now)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    info!(user_id = user.id, "user logged in");
    Ok((user, issued))
}

/// `Set-Cookie` value carrying the session token.
pub fn session_cookie(cfg: &CookieConfig, issued: &IssuedToken, now: OffsetDateTime) -> String {
    let max_age = (issued.expires_at - now).whole_seconds().max(0);
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        cfg.name, issued.token, max_age
    );
    if cfg.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{memory::MemoryStore, state::AppState};

    fn signup(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            first_name: "A".into(),
            last_name: "B".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn signup_reports_every_bad_field() {
        let err = validate_signup(&SignupRequest::default()).unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field).collect();
        assert_eq!(names, ["first_name", "last_name", "email", "password"]);
    }

    #[tokio::test]
    async fn register_stores_a_hash_not_the_password() {
        let store = MemoryStore::new();
        let user = register_user(&store, signup("a@b.com", "secret1")).await.unwrap();
        assert_ne!(user.password_hash, "secret1");
        assert!(verify_password("secret1", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        register_user(&store, signup("a@b.com", "secret1")).await.unwrap();
        let err = register_user(&store, signup("a@b.com", "other12")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict("email")));
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let state = AppState::in_memory();
        let store = MemoryStore::new();
        register_user(&store, signup("a@b.com", "secret1")).await.unwrap();
        let now = OffsetDateTime::now_utc();

        let wrong_pw = LoginRequest {
            email: "a@b.com".into(),
            password: "secret2".into(),
        };
        let unknown = LoginRequest {
            email: "x@y.com".into(),
            password: "secret1".into(),
        };
        for req in [wrong_pw, unknown] {
            let err = login_user(&store, &state.keys, req, now).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthenticated));
        }
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let state = AppState::in_memory();
        let store = MemoryStore::new();
        let user = register_user(&store, signup("a@b.com", "secret1")).await.unwrap();
        let now = OffsetDateTime::now_utc();
        let req = LoginRequest {
            email: "a@b.com".into(),
            password: "secret1".into(),
        };
        let (_, issued) = login_user(&store, &state.keys, req, now).await.unwrap();
        assert_eq!(state.keys.verify(&issued.token, now).unwrap().sub, user.id);
    }

    #[test]
    fn cookie_attributes() {
        let now = OffsetDateTime::now_utc();
        let issued = IssuedToken {
            token: "tok".into(),
            expires_at: now + time::Duration::hours(1),
        };
        let mut cfg = CookieConfig {
            name: "Authorization".into(),
            secure: false,
        };
        assert_eq!(
            session_cookie(&cfg, &issued, now),
            "Authorization=tok; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax"
        );
        cfg.secure = true;
        assert!(session_cookie(&cfg, &issued, now).ends_with("; Secure"));
    }
}

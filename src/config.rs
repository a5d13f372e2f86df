use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
}

/// Which store backs users and tasks.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub host: String,
    pub port: u16,
}

/// Longest accepted session lifetime (about ten years).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 366 * 10;

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let store = match vars.or("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: vars.get("DATABASE_URL").context("DATABASE_URL is not set")?,
                max_connections: vars.parse("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            "memory" => StoreBackend::Memory,
            other => anyhow::bail!("STORE_BACKEND must be `postgres` or `memory`, got `{other}`"),
        };

        let secret = vars.get("JWT_SECRET").context("JWT_SECRET is not set")?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let jwt = JwtConfig {
            secret,
            issuer: vars.or("JWT_ISSUER", "taskvault"),
            audience: vars.or("JWT_AUDIENCE", "taskvault-users"),
            ttl_minutes: vars.parse("JWT_TTL_MINUTES", 60 * 24 * 7)?,
        };
        anyhow::ensure!(
            (1..=MAX_TTL_MINUTES).contains(&jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}"
        );

        let cookie = CookieConfig {
            name: vars.or("AUTH_COOKIE_NAME", "Authorization"),
            secure: vars.parse("AUTH_COOKIE_SECURE", false)?,
        };

        Ok(Self {
            store,
            jwt,
            cookie,
            host: vars.or("APP_HOST", "0.0.0.0"),
            port: vars.parse("APP_PORT", 8080)?,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.into())
    }

    fn parse<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{key}: cannot parse `{raw}`: {e}")),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn memory_backend_with_defaults() {
        let cfg = load(&[("STORE_BACKEND", "memory"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.jwt.ttl_minutes, 60 * 24 * 7);
        assert_eq!(cfg.jwt.issuer, "taskvault");
        assert_eq!(cfg.cookie.name, "Authorization");
        assert!(!cfg.cookie.secure);
        assert_eq!((cfg.host.as_str(), cfg.port), ("0.0.0.0", 8080));
    }

    #[test]
    fn postgres_backend_needs_database_url() {
        let err = load(&[("JWT_SECRET", "s3cret")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let cfg = load(&[
            ("DATABASE_URL", "postgres://localhost/tasks"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/tasks".into(),
                max_connections: 4,
            }
        );
    }

    #[test]
    fn secret_must_be_present_and_non_empty() {
        let missing = load(&[("STORE_BACKEND", "memory")]).unwrap_err();
        assert!(missing.to_string().contains("JWT_SECRET is not set"));

        let empty = load(&[("STORE_BACKEND", "memory"), ("JWT_SECRET", "")]).unwrap_err();
        assert!(empty.to_string().contains("must not be empty"));
    }

    #[test]
    fn unknown_store_backend_is_rejected() {
        let err = load(&[("STORE_BACKEND", "sqlite"), ("JWT_SECRET", "s3cret")]).unwrap_err();
        assert!(err.to_string().contains("sqlite"));
    }

    #[test]
    fn ttl_is_bounded() {
        for bad in ["0", "-5", "1000000000000"] {
            let err = load(&[
                ("STORE_BACKEND", "memory"),
                ("JWT_SECRET", "s3cret"),
                ("JWT_TTL_MINUTES", bad),
            ])
            .unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "{bad}");
        }

        let cfg = load(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_MINUTES", "1440"),
        ])
        .unwrap();
        assert_eq!(cfg.jwt.ttl_minutes, 1440);
    }

    #[test]
    fn unparsable_number_names_the_variable() {
        let err = load(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", "s3cret"),
            ("APP_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }
}

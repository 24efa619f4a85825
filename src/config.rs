use std::fmt;

use anyhow::{bail, Context};

use crate::user::password::{HashScheme, DEFAULT_BCRYPT_COST};

/// Upper bound for `JWT_TTL_MINUTES`: ten years.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 10;

#[derive(Clone, Default)]
pub struct JwtConfig {
    pub secret: Option<String>,
    pub ttl_minutes: Option<i64>, // tokens never expire when unset
}

// Keep the secret out of logs.
impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordConfig {
    pub scheme: HashScheme,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        Ok(Self {
            database_url,
            max_connections,
            jwt: JwtConfig::from_lookup(&lookup)?,
            password: PasswordConfig::from_lookup(&lookup)?,
        })
    }
}

impl JwtConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let secret = lookup("JWT_SECRET").filter(|s| !s.is_empty());
        let ttl_minutes = match lookup("JWT_TTL_MINUTES") {
            Some(v) => {
                let minutes = v
                    .parse::<i64>()
                    .with_context(|| format!("JWT_TTL_MINUTES is not a number: {v}"))?;
                if minutes <= 0 {
                    bail!("JWT_TTL_MINUTES must be positive, got {minutes}");
                }
                if minutes > MAX_TTL_MINUTES {
                    bail!("JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}, got {minutes}");
                }
                Some(minutes)
            }
            None => None,
        };
        Ok(Self { secret, ttl_minutes })
    }
}

impl PasswordConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let scheme = match lookup("PASSWORD_SCHEME").as_deref() {
            None | Some("bcrypt") => {
                let cost = match lookup("BCRYPT_COST") {
                    Some(v) => v
                        .parse::<u32>()
                        .with_context(|| format!("BCRYPT_COST is not a number: {v}"))?,
                    None => DEFAULT_BCRYPT_COST,
                };
                if !(4..=31).contains(&cost) {
                    bail!("BCRYPT_COST must be between 4 and 31, got {cost}");
                }
                HashScheme::Bcrypt { cost }
            }
            Some("argon2") => HashScheme::Argon2,
            Some(other) => bail!("unknown PASSWORD_SCHEME: {other}"),
        };
        Ok(Self { scheme })
    }
}

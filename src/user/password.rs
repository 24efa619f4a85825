use std::fmt;

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{debug, error};

use crate::error::{UserError, UserResult};

pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Algorithm used for newly created hashes. Verification accepts either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    Bcrypt { cost: u32 },
    Argon2,
}

impl Default for HashScheme {
    fn default() -> Self {
        HashScheme::Bcrypt {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

/// A stored password hash. Never holds plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword([REDACTED])")
    }
}

impl HashedPassword {
    /// Hashes `plain` on the blocking pool.
    pub async fn hash(plain: &str, scheme: HashScheme) -> UserResult<Self> {
        let plain = plain.to_owned();
        let hash = tokio::task::spawn_blocking(move || hash_blocking(&plain, scheme))
            .await
            .map_err(|e| UserError::Hashing(e.to_string()))??;
        Ok(Self(hash))
    }

    /// Wraps a hash read back from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks `candidate` against this hash on the blocking pool.
    ///
    /// A malformed or unrecognised hash is an error, never a match.
    pub async fn verify(&self, candidate: &str) -> UserResult<bool> {
        let candidate = candidate.to_owned();
        let stored = self.0.clone();
        tokio::task::spawn_blocking(move || verify_blocking(&candidate, &stored))
            .await
            .map_err(|e| UserError::Comparison(e.to_string()))?
    }
}

fn hash_blocking(plain: &str, scheme: HashScheme) -> UserResult<String> {
    let hash = match scheme {
        HashScheme::Bcrypt { cost } => bcrypt::hash(plain, cost).map_err(|e| {
            error!(error = %e, "bcrypt hash error");
            UserError::Hashing(e.to_string())
        })?,
        HashScheme::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(plain.as_bytes(), &salt)
                .map_err(|e| {
                    error!(error = %e, "argon2 hash_password error");
                    UserError::Hashing(e.to_string())
                })?
                .to_string()
        }
    };
    debug!(scheme = ?scheme, "password hashed");
    Ok(hash)
}

fn verify_blocking(candidate: &str, stored: &str) -> UserResult<bool> {
    if stored.starts_with("$2") {
        return bcrypt::verify(candidate, stored).map_err(|e| {
            error!(error = %e, "bcrypt verify error");
            UserError::Comparison(e.to_string())
        });
    }

    if stored.starts_with("$argon2") {
        let parsed = PasswordHash::new(stored).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            UserError::Comparison(e.to_string())
        })?;
        if parsed.salt.is_none() || parsed.hash.is_none() {
            return Err(UserError::Comparison("argon2 hash has no salt or output".into()));
        }
        return match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify error");
                Err(UserError::Comparison(e.to_string()))
            }
        };
    }

    Err(UserError::Comparison("unrecognised password hash format".into()))
}

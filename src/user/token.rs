use std::sync::Arc;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::JwtConfig,
    error::{UserError, UserResult},
};

/// JWT payload. `_id` is the only application claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "_id")]
    pub user_id: Uuid,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and verifies HS256 user tokens with an explicitly supplied secret.
///
/// Built without a secret it still constructs, but every call fails with
/// [`UserError::Signing`].
#[derive(Clone)]
pub struct TokenSigner {
    keys: Option<Arc<Keys>>,
    ttl: Option<Duration>,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        let keys = (!secret.is_empty()).then(|| {
            Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            })
        });
        Self { keys, ttl: None }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        let signer = Self::new(cfg.secret.as_deref().unwrap_or_default());
        match cfg.ttl_minutes {
            Some(minutes) => signer.with_ttl(Duration::seconds(minutes.saturating_mul(60))),
            None => signer,
        }
    }

    /// Adds an `exp` claim to every token issued from now on.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn keys(&self) -> UserResult<&Keys> {
        self.keys.as_deref().ok_or_else(|| {
            warn!("JWT secret is not configured");
            UserError::Signing("JWT secret is not configured".into())
        })
    }

    pub fn sign(&self, user_id: Uuid) -> UserResult<String> {
        let keys = self.keys()?;
        let now = OffsetDateTime::now_utc();
        let exp = match self.ttl {
            Some(ttl) => {
                let exp = now.checked_add(ttl).ok_or_else(|| {
                    UserError::Signing(format!("token lifetime {ttl} is out of range"))
                })?;
                Some(exp.unix_timestamp())
            }
            None => None,
        };
        let claims = Claims {
            user_id,
            iat: now.unix_timestamp(),
            exp,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| UserError::Signing(e.to_string()))?;
        debug!(user_id = %user_id, expires = claims.exp.is_some(), "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> UserResult<Claims> {
        let keys = self.keys()?;
        let mut validation = Validation::default();
        validation.required_spec_claims.clear();
        if self.ttl.is_some() {
            validation.set_required_spec_claims(&["exp"]);
        }
        let data = decode::<Claims>(token, &keys.decoding, &validation)
            .map_err(|e| UserError::InvalidToken(e.to_string()))?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let signer = TokenSigner::new("dev-secret");
        let user_id = Uuid::new_v4();
        let token = signer.sign(user_id).expect("sign");
        let claims = signer.verify(&token).expect("verify");
        assert_eq!(claims.user_id, user_id);
        assert!(claims.exp.is_none());
        let now = OffsetDateTime::now_utc().unix_timestamp();
        assert!((now - claims.iat).abs() < 60);
    }

    #[test]
    fn verify_with_other_secret_fails() {
        let token = TokenSigner::new("secret-a").sign(Uuid::new_v4()).unwrap();
        let err = TokenSigner::new("secret-b").verify(&token).unwrap_err();
        assert!(matches!(err, UserError::InvalidToken(_)));
    }

    #[test]
    fn payload_carries_underscore_id() {
        let user_id = Uuid::new_v4();
        let token = TokenSigner::new("dev-secret").sign(user_id).unwrap();
        let mut validation = Validation::default();
        validation.required_spec_claims.clear();
        let raw = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"dev-secret"),
            &validation,
        )
        .unwrap();
        assert_eq!(raw.claims["_id"], user_id.to_string());
        assert!(raw.claims.get("exp").is_none());
        assert!(raw.claims.get("aud").is_none());
        assert!(raw.claims.get("iss").is_none());
    }

    #[test]
    fn missing_secret_is_a_signing_failure() {
        let signer = TokenSigner::from_config(&JwtConfig::default());
        let err = signer.sign(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, UserError::Signing(_)));
        assert!(matches!(signer.verify("a.b.c"), Err(UserError::Signing(_))));
    }

    #[test]
    fn ttl_adds_expiry() {
        let cfg = JwtConfig {
            secret: Some("dev-secret".into()),
            ttl_minutes: Some(15),
        };
        let signer = TokenSigner::from_config(&cfg);
        let claims = signer.verify(&signer.sign(Uuid::new_v4()).unwrap()).unwrap();
        assert_eq!(claims.exp, Some(claims.iat + 15 * 60));
    }

    #[test]
    fn out_of_range_lifetime_is_a_signing_failure() {
        let cfg = JwtConfig {
            secret: Some("s".into()),
            ttl_minutes: Some(1_000_000_000_000),
        };
        let err = TokenSigner::from_config(&cfg).sign(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, UserError::Signing(_)));

        let signer = TokenSigner::new("s").with_ttl(Duration::MAX);
        assert!(matches!(signer.sign(Uuid::new_v4()), Err(UserError::Signing(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::new("dev-secret").with_ttl(Duration::minutes(-10));
        let token = signer.sign(Uuid::new_v4()).unwrap();
        assert!(matches!(signer.verify(&token), Err(UserError::InvalidToken(_))));
    }

    #[test]
    fn signer_with_ttl_rejects_tokens_without_expiry() {
        let token = TokenSigner::new("dev-secret").sign(Uuid::new_v4()).unwrap();
        let strict = TokenSigner::new("dev-secret").with_ttl(Duration::minutes(5));
        assert!(strict.verify(&token).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = TokenSigner::new("dev-secret");
        let mut token = signer.sign(Uuid::new_v4()).unwrap();
        token.push('x');
        assert!(signer.verify(&token).is_err());
    }
}

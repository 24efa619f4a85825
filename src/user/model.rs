use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{FieldViolation, UserError, UserResult};

use super::{
    password::{HashScheme, HashedPassword},
    token::TokenSigner,
    validation::validate_new_user,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullName {
    pub firstname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
}

impl FullName {
    pub fn new(firstname: impl Into<String>, lastname: Option<&str>) -> Self {
        Self {
            firstname: firstname.into(),
            lastname: lastname.map(str::to_owned),
        }
    }
}

/// Which columns a read returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Select {
    /// Everything except the password hash.
    #[default]
    Default,
    /// Also load the password hash, e.g. for login.
    WithPassword,
}

/// A user about to be stored. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: FullName,
    pub email: String,
    pub password: HashedPassword,
    pub socket_id: Option<String>,
}

impl NewUser {
    pub fn new(fullname: FullName, email: impl Into<String>, password: HashedPassword) -> Self {
        Self {
            fullname,
            email: email.into(),
            password,
            socket_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        validate_new_user(self)
    }
}

/// A persisted user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub fullname: FullName,
    pub email: String,
    #[serde(skip)]
    pub password: Option<HashedPassword>, // None unless read with Select::WithPassword
    #[serde(rename = "socketId", default, skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Hashes a plaintext password for storage in a new user.
    pub async fn hash_password(plain: &str, scheme: HashScheme) -> UserResult<HashedPassword> {
        HashedPassword::hash(plain, scheme).await
    }

    /// Compares `candidate` with the stored hash.
    ///
    /// Fails if the user was loaded without its password.
    pub async fn compare_password(&self, candidate: &str) -> UserResult<bool> {
        let stored = self.password.as_ref().ok_or_else(|| {
            UserError::Comparison("password hash was not loaded for this user".into())
        })?;
        stored.verify(candidate).await
    }

    pub fn generate_auth_token(&self, signer: &TokenSigner) -> UserResult<String> {
        signer.sign(self.id)
    }

    pub(crate) fn project(mut self, select: Select) -> Self {
        if select == Select::Default {
            self.password = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(password: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            fullname: FullName::new("Ann", Some("Lee")),
            email: "ann@x.co".into(),
            password: password.map(HashedPassword::from_stored),
            socket_id: Some("sock-1".into()),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn serialization_never_includes_password() {
        let json = serde_json::to_value(sample(Some("$2b$10$secret"))).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["fullname"]["firstname"], "Ann");
        assert_eq!(json["socketId"], "sock-1");
    }

    #[test]
    fn lastname_omitted_when_absent() {
        let mut user = sample(None);
        user.fullname.lastname = None;
        user.socket_id = None;
        let json = serde_json::to_value(&user).unwrap();
        assert!(json["fullname"].get("lastname").is_none());
        assert!(json.get("socketId").is_none());
    }

    #[test]
    fn default_projection_drops_password() {
        let user = sample(Some("$2b$10$secret"));
        assert!(user.clone().project(Select::WithPassword).password.is_some());
        assert!(user.project(Select::Default).password.is_none());
    }

    #[tokio::test]
    async fn compare_without_loaded_password_fails() {
        let err = sample(None).compare_password("anything").await.unwrap_err();
        assert!(matches!(err, UserError::Comparison(_)));
    }

    #[tokio::test]
    async fn compare_with_loaded_password() {
        let hash = User::hash_password("secret123", HashScheme::Bcrypt { cost: 4 })
            .await
            .unwrap();
        let mut user = sample(None);
        user.password = Some(hash);
        assert!(user.compare_password("secret123").await.unwrap());
        assert!(!user.compare_password("wrong").await.unwrap());
    }

    #[test]
    fn token_decodes_to_user_id() {
        let user = sample(None);
        let signer = TokenSigner::new("dev-secret");
        let token = user.generate_auth_token(&signer).unwrap();
        assert_eq!(signer.verify(&token).unwrap().user_id, user.id);
    }
}

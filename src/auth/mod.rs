//! Authentication: JWT gate and user accounts.
//!
//! [`AuthGate`] issues and verifies HS256 bearer tokens and supplies the
//! request identity to the pipeline. The three verification failure modes
//! (missing, invalid, expired) surface as distinct errors so the server
//! layer can produce the matching 401 bodies.

mod users;

pub use users::{MemoryUserStore, User, UserStore};

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{AgrogateError, Result};

/// Claims carried in an agrogate access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued for.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies bearer tokens.
pub struct AuthGate {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl AuthGate {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; no clock leeway.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issue a token for `user_id` with the configured TTL.
    pub fn issue(&self, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding).map_err(Into::into)
    }

    /// Verify a bare token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<String> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims.sub)
    }

    /// Resolve the identity for a request from its `Authorization` header.
    ///
    /// A missing header or one without a `Bearer ` scheme is
    /// [`AgrogateError::MissingToken`]; verification failures come back as
    /// invalid or expired.
    pub fn identity_for(&self, authorization: Option<&str>) -> Result<String> {
        let header = authorization.ok_or(AgrogateError::MissingToken)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AgrogateError::MissingToken)?;
        self.verify(token.trim())
    }
}

/// An authenticated session returned by login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub name: String,
    pub email: String,
}

/// Registration and login on top of a [`UserStore`] and an [`AuthGate`].
pub struct AuthService {
    users: Arc<dyn UserStore>,
    gate: AuthGate,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, gate: AuthGate) -> Self {
        Self { users, gate }
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Register a new user with a salted Argon2id password hash.
    ///
    /// A duplicate email is [`AgrogateError::UserExists`].
    pub async fn register(&self, name: Option<&str>, email: &str, password: &str) -> Result<()> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AgrogateError::UserExists);
        }
        let user = User::new(name, email, &users::hash_password(password)?);
        self.users.insert(user).await
    }

    /// Verify credentials and issue a token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AgrogateError::InvalidCredentials)?;
        if !users::verify_password(password, &user.password_hash) {
            return Err(AgrogateError::InvalidCredentials);
        }
        let token = self.gate.issue(&user.id)?;
        Ok(Session {
            token,
            name: user.name.unwrap_or_else(|| "User".to_string()),
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_and_verify_round_trip() {
        let gate = AuthGate::new("test-secret", Duration::hours(1));
        let token = gate.issue("user-42").unwrap();
        assert_eq!(gate.verify(&token).unwrap(), "user-42");
    }

    #[test]
    fn expired_token_is_distinct_from_invalid() {
        let gate = AuthGate::new("test-secret", Duration::seconds(-60));
        let token = gate.issue("user-42").unwrap();
        assert!(matches!(
            gate.verify(&token),
            Err(AgrogateError::ExpiredToken)
        ));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let gate = AuthGate::new("test-secret", Duration::hours(1));
        let other = AuthGate::new("other-secret", Duration::hours(1));
        let token = gate.issue("user-42").unwrap();
        assert!(matches!(
            other.verify(&token),
            Err(AgrogateError::InvalidToken(_))
        ));
    }

    #[test]
    fn identity_requires_bearer_scheme() {
        let gate = AuthGate::new("test-secret", Duration::hours(1));
        assert!(matches!(
            gate.identity_for(None),
            Err(AgrogateError::MissingToken)
        ));
        assert!(matches!(
            gate.identity_for(Some("Token abc")),
            Err(AgrogateError::MissingToken)
        ));
    }
}

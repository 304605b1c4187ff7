//! User accounts and password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{AgrogateError, Result};

/// A registered user account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    /// PHC-format Argon2id hash.
    pub password_hash: String,
}

impl User {
    pub fn new(name: Option<&str>, email: &str, password_hash: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.map(str::to_string),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        }
    }
}

/// Collaborator interface for user account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Insert a new user. A duplicate email is [`AgrogateError::UserExists`].
    async fn insert(&self, user: User) -> Result<()>;
}

/// In-memory user store.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AgrogateError::UserExists);
        }
        users.push(user);
        Ok(())
    }
}

/// Hash a password with Argon2id and a fresh salt.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AgrogateError::Configuration(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored PHC hash.
///
/// An unparsable stored hash verifies as false rather than erroring; the
/// caller only learns that the credentials did not match.
pub(crate) fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

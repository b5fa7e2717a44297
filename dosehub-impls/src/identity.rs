use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use async_trait::async_trait;
use dashmap::DashMap;
use rand::rngs::OsRng;

use dosehub_family::{AuthError, IdentityProvider};

/// An identity provider that keeps hashed credentials in memory.
pub struct MemoryIdentity {
    credentials: DashMap<String, String>,
    argon: Argon2<'static>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self {
            credentials: Default::default(),
            argon: Argon2::default(),
        }
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if self.credentials.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Provider(e.to_string()))?
            .to_string();

        self.credentials.insert(email.to_string(), hashed_password);
        Ok(())
    }

    async fn verify(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let stored = self
            .credentials
            .get(email)
            .ok_or(AuthError::InvalidCredentials)?;

        let stored_password = PasswordHash::parse(stored.as_str(), Encoding::default())
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        self.argon
            .verify_password(password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

use async_trait::async_trait;
use thiserror::Error;

use dosehub_core::{NewUser, Store, StoreError, UserRecord};

use crate::FamilyContext;

/// Represents an external service that holds credentials and verifies them.
/// Passwords never reach the store; only the provider sees them.
#[async_trait]
pub trait IdentityProvider
where
    Self: 'static + Sync + Send,
{
    /// Registers new credentials for the given email.
    async fn register(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Checks the given credentials.
    async fn verify(&self, email: &str, password: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("An account with this email already exists")]
    EmailTaken,
    /// The identity provider rejected the request for its own reasons.
    /// Surfaced to the user as-is.
    #[error("{0}")]
    Provider(String),
    /// Something else went wrong with the store
    #[error(transparent)]
    Store(StoreError),
}

pub struct Auth<S, P> {
    context: FamilyContext<S, P>,
}

impl<S, P> Auth<S, P>
where
    S: Store,
    P: IdentityProvider,
{
    pub fn new(context: &FamilyContext<S, P>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Registers credentials with the provider, then creates the account
    /// record. The new account belongs to no hub yet.
    pub async fn sign_up(&self, new_account: NewAccount) -> Result<UserRecord, AuthError> {
        let email = new_account.email.trim().to_string();

        self.context
            .provider
            .register(&email, &new_account.password)
            .await?;

        self.context
            .store
            .create_user(NewUser {
                name: new_account.name,
                email,
            })
            .await
            .map_err(AuthError::Store)
    }

    /// Verifies credentials with the provider and loads the account record.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<UserRecord, AuthError> {
        let email = credentials.email.trim();

        self.context
            .provider
            .verify(email, &credentials.password)
            .await?;

        self.context
            .store
            .user_by_email(email)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => AuthError::InvalidCredentials,
                err => AuthError::Store(err),
            })
    }
}

#[derive(Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

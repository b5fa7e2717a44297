use log::info;
use thiserror::Error;

use dosehub_core::{HubId, HubRecord, NewHub, Store, StoreError, UserId};

use crate::{util::random_code, FamilyContext, IdentityProvider};

const JOIN_CODE_LENGTH: usize = 6;
/// How many fresh codes to try when creation keeps colliding
const JOIN_CODE_ATTEMPTS: usize = 8;

pub struct HubManager<S, P> {
    context: FamilyContext<S, P>,
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Please enter a hub name")]
    NameRequired,
    /// The code doesn't match any hub, or isn't a valid code at all
    #[error("Invalid Code! Please check and try again.")]
    InvalidCode,
    #[error("Could not find an unused join code")]
    CodeExhausted,
    #[error(transparent)]
    Store(StoreError),
}

impl<S, P> HubManager<S, P>
where
    S: Store,
    P: IdentityProvider,
{
    pub fn new(context: &FamilyContext<S, P>) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Creates a hub with the founder as admin and sole member, and points
    /// the founder's account at it. The join code is regenerated until the
    /// store accepts it as unique.
    pub async fn create_hub(&self, name: &str, founder: &UserId) -> Result<HubRecord, HubError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(HubError::NameRequired);
        }

        for _ in 0..JOIN_CODE_ATTEMPTS {
            let new_hub = NewHub {
                name: name.to_string(),
                join_code: random_code(JOIN_CODE_LENGTH),
                admin: founder.clone(),
            };

            let hub = match self.context.store.create_hub(new_hub).await {
                Ok(hub) => hub,
                Err(StoreError::Conflict { .. }) => continue,
                Err(err) => return Err(HubError::Store(err)),
            };

            self.context
                .store
                .set_user_hub(founder, &hub.id)
                .await
                .map_err(HubError::Store)?;

            info!("Hub \"{}\" created with join code {}", hub.name, hub.join_code);

            return Ok(hub);
        }

        Err(HubError::CodeExhausted)
    }

    /// Adds the user to the hub matching the code and points their account
    /// at it. Joining a hub twice is harmless.
    pub async fn join_hub(&self, code: &str, user: &UserId) -> Result<HubRecord, HubError> {
        let code = normalize_code(code)?;

        let hub = self
            .context
            .store
            .hub_by_join_code(&code)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => HubError::InvalidCode,
                err => HubError::Store(err),
            })?;

        let hub = self
            .context
            .store
            .add_hub_member(&hub.id, user)
            .await
            .map_err(HubError::Store)?;

        self.context
            .store
            .set_user_hub(user, &hub.id)
            .await
            .map_err(HubError::Store)?;

        info!("User {} joined hub \"{}\"", user, hub.name);

        Ok(hub)
    }

    /// Loads a hub for display.
    pub async fn hub_by_id(&self, hub_id: &HubId) -> Result<HubRecord, StoreError> {
        self.context.store.hub_by_id(hub_id).await
    }
}

/// Join codes are entered by hand, so stray whitespace and lowercase are
/// forgiven. Anything else is rejected before the store is asked.
fn normalize_code(code: &str) -> Result<String, HubError> {
    let code = code.trim().to_uppercase();

    let valid = code.len() == JOIN_CODE_LENGTH
        && code.bytes().all(|b| b.is_ascii_alphanumeric());

    if valid {
        Ok(code)
    } else {
        Err(HubError::InvalidCode)
    }
}

mod auth;
mod hubs;
mod medications;
mod summary;
mod util;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

pub use auth::*;
pub use hubs::*;
pub use medications::*;
pub use summary::*;

use dosehub_core::{Config, NotificationSink, Store, Tracker};

/// The dosehub family system, facilitating accounts, hubs, medication
/// management, and the dose tracker.
pub struct Family<S, P, N> {
    store: Arc<S>,
    provider: Arc<P>,

    pub auth: Auth<S, P>,
    pub hubs: HubManager<S, P>,
    pub medications: MedicationManager<S, P>,
    pub tracker: Tracker<S, N>,
}

/// A type passed to the components of the family system, to reach the store
/// and the identity provider.
pub struct FamilyContext<S, P> {
    pub store: Arc<S>,
    pub provider: Arc<P>,
}

impl<S, P, N> Family<S, P, N>
where
    S: Store,
    P: IdentityProvider,
    N: NotificationSink,
{
    pub fn new(config: Config, store: S, provider: P, sink: N) -> Self {
        let store = Arc::new(store);
        let provider = Arc::new(provider);
        let sink = Arc::new(sink);

        let context = FamilyContext {
            store: store.clone(),
            provider: provider.clone(),
        };

        Self {
            auth: Auth::new(&context),
            hubs: HubManager::new(&context),
            medications: MedicationManager::new(&context),
            tracker: Tracker::new(config, store.clone(), sink),
            store,
            provider,
        }
    }
}

impl<S, P> Clone for FamilyContext<S, P>
where
    S: Store,
    P: IdentityProvider,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            provider: self.provider.clone(),
        }
    }
}

use crate::auth::IdentityProvider;
use crate::cache::Cache;
use crate::clock::Clock;
use crate::storage::Datastore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Datastore>,
    pub cache: Arc<dyn Cache>,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Datastore>,
        cache: Arc<dyn Cache>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache,
            identity,
            clock,
        }
    }
}

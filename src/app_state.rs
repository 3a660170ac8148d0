use std::sync::Arc;

use crate::config::Config;
use crate::db::store::Store;
use crate::error::AppError;
use crate::middleware::auth::{create_identity_cache, IdentityCache};
use crate::utils::api_response::ApiResponse;
use crate::utils::notification::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<Config>,
    pub notifier: Notifier,
    pub identities: IdentityCache,
}

impl AppState {
    /// Spawns the notification worker, so it must run inside a tokio runtime.
    pub fn new(store: Store, config: Config) -> Self {
        let notifier = Notifier::start(&config, store.clone());
        Self {
            store,
            config: Arc::new(config),
            notifier,
            identities: create_identity_cache(),
        }
    }

    pub fn fail(&self, err: AppError) -> ApiResponse<()> {
        err.into_api(self.config.is_development())
    }
}

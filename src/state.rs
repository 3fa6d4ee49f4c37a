use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::{RootIds, TokenService};
use crate::config::{AppConfig, Keys};
use crate::database::Store;
use crate::security::Codec;

/// Everything a handler needs, built once at startup and shared read-only
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub codec: Codec,
    pub tokens: TokenService,
    pub root: RootIds,
    pub started: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store, keys: Keys, root: RootIds) -> Self {
        let codec = Codec::new(keys.key, config.security.argon2);
        let tokens = TokenService::new(
            keys.signing_key,
            config.security.token_issuer.clone(),
            config.security.token_expiry_secs,
        );
        Self {
            config: Arc::new(config),
            store,
            codec,
            tokens,
            root,
            started: Utc::now(),
        }
    }
}

//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::auth::TokenSigner;
use crate::config::Config;
use lpms_core::petition::TemplateCatalog;
use lpms_core::ports::{CompletionService, CourtPortalService, DatabaseService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub tokens: TokenSigner,
    pub completion: Arc<dyn CompletionService>,
    pub court: Arc<dyn CourtPortalService>,
    pub templates: Arc<TemplateCatalog>,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        config: Arc<Config>,
        completion: Arc<dyn CompletionService>,
        court: Arc<dyn CourtPortalService>,
    ) -> Self {
        let tokens = TokenSigner::new(config.jwt_secret.as_bytes(), config.token_ttl);
        Self {
            db,
            config,
            tokens,
            completion,
            court,
            templates: Arc::new(TemplateCatalog::default()),
        }
    }
}

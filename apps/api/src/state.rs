//! Shared application state.

use std::sync::Arc;

use harvest_db::{AccountStore, DocumentStore};

use crate::config::AppConfig;
use crate::gateway::PaymentGateway;

/// Handles shared by every request.
pub struct AppState {
    pub documents: DocumentStore,
    pub accounts: AccountStore,
    pub gateway: Arc<dyn PaymentGateway>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        documents: DocumentStore,
        accounts: AccountStore,
        gateway: Arc<dyn PaymentGateway>,
        config: AppConfig,
    ) -> Arc<Self> {
        Arc::new(AppState {
            documents,
            accounts,
            gateway,
            config,
        })
    }
}

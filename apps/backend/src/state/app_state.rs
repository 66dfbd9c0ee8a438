use std::sync::Arc;

use super::security_config::SecurityConfig;
use crate::error::AppError;
use crate::storage::Storage;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Storage gateway (optional for test scenarios that never touch it)
    pub store: Option<Arc<dyn Storage>>,
    /// Security configuration including JWT settings
    pub security: SecurityConfig,
}

impl AppState {
    /// Create a new AppState with the given storage gateway and security config
    pub fn new(store: Arc<dyn Storage>, security: SecurityConfig) -> Self {
        Self {
            store: Some(store),
            security,
        }
    }

    /// Create a new AppState without a storage gateway (for testing)
    pub fn without_store(security: SecurityConfig) -> Self {
        Self {
            store: None,
            security,
        }
    }

    /// Borrow the storage gateway, failing if none was configured.
    pub fn require_store(&self) -> Result<&dyn Storage, AppError> {
        self.store
            .as_deref()
            .ok_or_else(|| AppError::internal("Storage not available"))
    }
}

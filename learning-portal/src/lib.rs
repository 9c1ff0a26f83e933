pub mod config;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use config::{AccessSettings, GuardianSettings};
use services::AccessControl;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access: Arc<AccessControl>,
    pub access_settings: Arc<AccessSettings>,
    pub guardian_settings: Arc<GuardianSettings>,
}

impl AppState {
    pub fn new(
        access: AccessControl,
        access_settings: AccessSettings,
        guardian_settings: GuardianSettings,
    ) -> Self {
        Self {
            access: Arc::new(access),
            access_settings: Arc::new(access_settings),
            guardian_settings: Arc::new(guardian_settings),
        }
    }
}

//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::services::RunManagerTrait;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub run_manager: Arc<dyn RunManagerTrait>,
}

impl AppState {
    pub fn new(run_manager: Arc<dyn RunManagerTrait>) -> Self {
        Self { run_manager }
    }
}

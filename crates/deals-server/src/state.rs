//! Application State

use std::sync::Arc;

use deals_core::DealFinder;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// All registered source adapters behind the fan-out / stream façade
    pub finder: Arc<DealFinder>,
}

//! jalsevak-ai library interface
//!
//! Exposes the translation coordinator, advisory service and HTTP router
//! for the binary and for integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod inference;
pub mod locale;
pub mod providers;
pub mod translation;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use crate::inference::AdvisoryService;
use crate::providers::Providers;
use crate::translation::{CoordinatorConfig, TranslationCoordinator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Batch translation for UI strings and free text
    pub coordinator: TranslationCoordinator,
    /// Crop, irrigation, soil and scheme advisories
    pub advisory: AdvisoryService,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(coordinator: TranslationCoordinator, advisory: AdvisoryService) -> Self {
        Self {
            coordinator,
            advisory,
            startup_time: Utc::now(),
        }
    }

    /// Wire state from constructed providers
    pub fn from_providers(providers: Providers, config: CoordinatorConfig) -> Self {
        Self::new(
            TranslationCoordinator::new(providers.translator, config),
            AdvisoryService::new(providers.model),
        )
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::translate_routes())
        .merge(api::advisory_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

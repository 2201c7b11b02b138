//! HTTP API handlers for jalsevak-ai

pub mod advisory;
pub mod health;
pub mod translate;

pub use advisory::advisory_routes;
pub use health::health_routes;
pub use translate::translate_routes;

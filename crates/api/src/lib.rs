//! Fund risk onboarding service: HTTP routes, batch export and the shared app context.

pub mod app;
pub mod config;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod routes;
pub mod summary;

pub use app::{AppContext, FundBatch};
pub use config::{AppConfig, LogFormat};
pub use logging::init_tracing;
pub use metrics::{Metrics, MetricsSnapshot};
pub use routes::router;
pub use summary::BatchSummary;

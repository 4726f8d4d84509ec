//! HTTP inference service for a dual-axis solar tracker.
//!
//! Two pre-trained regression models turn eight sensor/position readings
//! into horizontal and vertical servo angles.

pub mod config;
pub mod model;
pub mod routes;
pub mod service;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use model::{ModelError, RegressionModel, Regressor};
pub use routes::{router, ApiError};
pub use service::{PredictionError, PredictionService};
pub use store::ModelStore;
pub use types::{PredictionRequest, PredictionResponse, ValidationError, FEATURE_ORDER};

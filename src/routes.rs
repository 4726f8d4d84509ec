use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::service::{PredictionError, PredictionService};
use crate::types::{HealthResponse, PredictionRequest, PredictionResponse, ValidationError};

// ---------- Errors ----------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, Json(e)).into_response(),
            ApiError::Prediction(e) => {
                tracing::error!("prediction failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
                    .into_response()
            }
        }
    }
}

// ---------- Server state ----------

pub type AppState = Arc<PredictionService>;

// ---------- Handlers ----------

pub async fn root(State(svc): State<AppState>) -> Json<HealthResponse> {
    Json(svc.health_check())
}

// Takes raw bytes so validation stays ours: content-type is not enforced and
// every bad field is reported before any model runs.
pub async fn predict(
    State(svc): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let req = PredictionRequest::from_json(&body)?;
    Ok(Json(svc.predict(&req)?))
}

pub fn router(svc: PredictionService) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .with_state(Arc::new(svc))
}

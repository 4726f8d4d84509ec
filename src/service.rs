use crate::model::ModelError;
use crate::store::ModelStore;
use crate::types::{
    FeatureVector, HealthResponse, PredictionRequest, PredictionResponse, ANGLE_NOTE,
    FEATURE_ORDER, HEALTH_MESSAGE,
};

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Round half away from zero to two decimals.
///
/// Exact binary ties (0.125) go away from zero, so this can differ from
/// banker's rounding in the last digit. Magnitudes at or above 1e15 carry no
/// fractional digits and are returned as-is, since scaling them could overflow.
pub fn round2(x: f64) -> f64 {
    if x.abs() >= 1e15 {
        return x;
    }
    (x * 100.0).round() / 100.0
}

/// Stateless request logic on top of an immutable model store.
#[derive(Clone)]
pub struct PredictionService {
    store: ModelStore,
    log_predictions: bool,
}

impl PredictionService {
    pub fn new(store: ModelStore) -> Self {
        Self { store, log_predictions: false }
    }

    /// Emit a per-request trace line (the `LOG_PRED=1` debug switch).
    pub fn with_prediction_logging(mut self, on: bool) -> Self {
        self.log_predictions = on;
        self
    }

    pub fn health_check(&self) -> HealthResponse {
        HealthResponse { status: "ok".to_string(), message: HEALTH_MESSAGE.to_string() }
    }

    pub fn predict(&self, req: &PredictionRequest) -> Result<PredictionResponse, PredictionError> {
        let x = req.features();

        // Both axes or nothing.
        let pred_h = self.store.predict_horizontal(&x)?;
        let pred_v = self.store.predict_vertical(&x)?;

        if self.log_predictions {
            trace_prediction(&x, pred_h, pred_v);
        }

        Ok(PredictionResponse {
            status: "success".to_string(),
            pred_horiz: round2(pred_h),
            pred_vert: round2(pred_v),
            note: ANGLE_NOTE.to_string(),
        })
    }
}

fn trace_prediction(x: &FeatureVector, pred_h: f64, pred_v: f64) {
    let sample: Vec<String> = FEATURE_ORDER
        .iter()
        .zip(x.iter())
        .map(|(name, v)| format!("{}={:.3}", name, v))
        .collect();
    tracing::info!(
        "predict in=[{}] raw_h={:.4} raw_v={:.4}",
        sample.join(", "),
        pred_h,
        pred_v
    );
}

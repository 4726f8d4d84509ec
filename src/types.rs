use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const N_FEATURES: usize = 8;

/// Model input, always laid out in `FEATURE_ORDER`.
pub type FeatureVector = [f64; N_FEATURES];

// Training order of the model inputs. Reordering this silently breaks predictions.
pub const FEATURE_ORDER: [&str; N_FEATURES] = [
    "ldr_tl", "ldr_tr", "ldr_bl", "ldr_br", "horiz_pos", "vert_pos", "sun_az", "sun_el",
];

pub const HEALTH_MESSAGE: &str = "IoTricity API is running";
pub const ANGLE_NOTE: &str = "Angles are in degrees (0–180)";

// ---------- Request ----------

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct PredictionRequest {
    pub ldr_tl: f64,
    pub ldr_tr: f64,
    pub ldr_bl: f64,
    pub ldr_br: f64,
    pub horiz_pos: f64,
    pub vert_pos: f64,
    pub sun_az: f64,
    pub sun_el: f64,
}

impl PredictionRequest {
    /// Parse and validate a raw request body.
    ///
    /// Every offending field is reported, not just the first one.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let raw: Value = serde_json::from_slice(body).map_err(|e| {
            ValidationError::single(FieldIssue::body(IssueKind::JsonInvalid, e.to_string()))
        })?;
        Self::from_value(&raw)
    }

    pub fn from_value(raw: &Value) -> Result<Self, ValidationError> {
        let Some(obj) = raw.as_object() else {
            return Err(ValidationError::single(FieldIssue::body(
                IssueKind::ModelAttributesType,
                "Input should be a valid dictionary or object".to_string(),
            )));
        };

        let mut x = [0.0; N_FEATURES];
        let mut issues = Vec::new();
        for (slot, name) in x.iter_mut().zip(FEATURE_ORDER) {
            match obj.get(name) {
                None => issues.push(FieldIssue::field(name, IssueKind::Missing, "Field required")),
                Some(v) => match v.as_f64() {
                    Some(f) => *slot = f,
                    None => issues.push(FieldIssue::field(
                        name,
                        IssueKind::FloatType,
                        "Input should be a valid number",
                    )),
                },
            }
        }

        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }
        Ok(Self::from_features(x))
    }

    pub fn from_features(x: FeatureVector) -> Self {
        let [ldr_tl, ldr_tr, ldr_bl, ldr_br, horiz_pos, vert_pos, sun_az, sun_el] = x;
        Self { ldr_tl, ldr_tr, ldr_bl, ldr_br, horiz_pos, vert_pos, sun_az, sun_el }
    }

    /// Ordered model input; must match `FEATURE_ORDER`.
    pub fn features(&self) -> FeatureVector {
        [
            self.ldr_tl,
            self.ldr_tr,
            self.ldr_bl,
            self.ldr_br,
            self.horiz_pos,
            self.vert_pos,
            self.sun_az,
            self.sun_el,
        ]
    }
}

// ---------- Validation errors ----------

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    FloatType,
    JsonInvalid,
    ModelAttributesType,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: IssueKind,
}

impl FieldIssue {
    fn field(name: &str, kind: IssueKind, msg: &str) -> Self {
        Self { loc: vec!["body".to_string(), name.to_string()], msg: msg.to_string(), kind }
    }

    fn body(kind: IssueKind, msg: String) -> Self {
        Self { loc: vec!["body".to_string()], msg, kind }
    }

    /// The offending field name, if the issue is about one field.
    pub fn field_name(&self) -> Option<&str> {
        self.loc.get(1).map(String::as_str)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, thiserror::Error)]
#[error("request validation failed: {}", summarize(.issues))]
pub struct ValidationError {
    #[serde(rename = "detail")]
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    fn single(issue: FieldIssue) -> Self {
        Self { issues: vec![issue] }
    }

    pub fn fields(&self) -> Vec<&str> {
        self.issues.iter().filter_map(FieldIssue::field_name).collect()
    }
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.loc.join("."), i.msg))
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------- Responses ----------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PredictionResponse {
    pub status: String,
    pub pred_horiz: f64,
    pub pred_vert: f64,
    pub note: String,
}

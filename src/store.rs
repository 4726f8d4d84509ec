use anyhow::Result;
use std::{path::Path, sync::Arc};

use crate::model::{ArtifactModel, ModelError, RegressionModel, Regressor};
use crate::types::FeatureVector;

/// The two trained models. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct ModelStore {
    horizontal: Arc<dyn Regressor>,
    vertical: Arc<dyn Regressor>,
}

impl ModelStore {
    /// Load both artifacts. Any failure here means the process must not serve.
    pub fn load(horiz_path: impl AsRef<Path>, vert_path: impl AsRef<Path>) -> Result<Self> {
        let h = RegressionModel::load(horiz_path)?;
        let v = RegressionModel::load(vert_path)?;
        Ok(Self::from_models(
            ArtifactModel::new("horizontal", h)?,
            ArtifactModel::new("vertical", v)?,
        ))
    }

    pub fn from_models(h: impl Regressor + 'static, v: impl Regressor + 'static) -> Self {
        Self::from_shared(Arc::new(h), Arc::new(v))
    }

    pub fn from_shared(horizontal: Arc<dyn Regressor>, vertical: Arc<dyn Regressor>) -> Self {
        Self { horizontal, vertical }
    }

    pub fn predict_horizontal(&self, x: &FeatureVector) -> Result<f64, ModelError> {
        self.horizontal.predict(x)
    }

    pub fn predict_vertical(&self, x: &FeatureVector) -> Result<f64, ModelError> {
        self.vertical.predict(x)
    }

    pub fn describe(&self) -> (String, String) {
        (self.horizontal.describe(), self.vertical.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    struct Const(f64);

    impl Regressor for Const {
        fn predict(&self, _x: &FeatureVector) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("iotricity-store-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn routes_each_axis_to_its_model() {
        let store = ModelStore::from_models(Const(12.0), Const(34.0));
        let x = [0.0; 8];
        assert_eq!(store.predict_horizontal(&x).unwrap(), 12.0);
        assert_eq!(store.predict_vertical(&x).unwrap(), 34.0);
        assert_eq!(store.describe(), ("custom".to_string(), "custom".to_string()));
    }

    #[test]
    fn loads_artifacts_from_disk() {
        let dir = scratch_dir("ok");
        let h = dir.join("model_h.json");
        let v = dir.join("model_v.json");
        fs::write(&h, r#"{"kind":"linear","intercept":10,"coefficients":[0,0,0,0,1,0,0,0]}"#).unwrap();
        fs::write(&v, r#"{"kind":"linear","intercept":-5,"coefficients":[0,0,0,0,0,1,0,0]}"#).unwrap();

        let store = ModelStore::load(&h, &v).unwrap();
        let x = [0.0, 0.0, 0.0, 0.0, 90.0, 45.0, 0.0, 0.0];
        assert_eq!(store.predict_horizontal(&x).unwrap(), 100.0);
        assert_eq!(store.predict_vertical(&x).unwrap(), 40.0);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_or_corrupt_artifact_is_fatal() {
        let dir = scratch_dir("bad");
        let good = dir.join("model_h.json");
        let corrupt = dir.join("model_v.json");
        fs::write(&good, r#"{"kind":"linear","intercept":0,"coefficients":[0,0,0,0,0,0,0,0]}"#).unwrap();
        fs::write(&corrupt, "\u{80}binary pickle").unwrap();

        let err = ModelStore::load(&good, dir.join("nope.json")).err().unwrap();
        assert!(err.to_string().contains("nope.json"));

        let err = ModelStore::load(&good, &corrupt).err().unwrap();
        assert!(err.to_string().contains("model_v.json"));
        fs::remove_dir_all(dir).ok();
    }
}

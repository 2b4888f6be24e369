use ndarray::Axis;
use rand::Rng;
use std::ops::Range;
use tracing::warn;

use crate::artifacts::ArtifactStore;
use crate::encoder;
use crate::error::{Result, ServiceError};

/// Plausible price range the service answers with when the model cannot.
const FALLBACK_RANGE: Range<f64> = 50.0..150.0;

/// Outcome of a price estimation: a real model prediction, or the synthetic
/// estimate used when the model could not answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceEstimate {
    Model(f64),
    Fallback(f64),
}

impl PriceEstimate {
    pub fn value(self) -> f64 {
        match self {
            Self::Model(value) | Self::Fallback(value) => value,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Estimates a price for the given listing, rounded to 2 decimal places.
///
/// Triggers an artifact load if none has happened yet. Any model failure
/// (absent artifacts, feature width mismatch) degrades to a uniform draw
/// from the fallback range instead of an error, keeping the endpoint
/// available.
pub fn estimate_price(store: &ArtifactStore, location: &str, sqft: f64, bhk: i32, bath: i32) -> PriceEstimate {
    store.ensure_loaded();
    match model_estimate(store, location, sqft, bhk, bath) {
        Ok(price) => PriceEstimate::Model(price),
        Err(err) => {
            let price = round2(rand::rng().random_range(FALLBACK_RANGE));
            warn!("model prediction failed ({err}), returning synthetic estimate {price}");
            PriceEstimate::Fallback(price)
        }
    }
}

fn model_estimate(store: &ArtifactStore, location: &str, sqft: f64, bhk: i32, bath: i32) -> Result<f64> {
    let artifacts = store.snapshot().ok_or(ServiceError::ArtifactsUnavailable)?;
    let features = encoder::encode(&artifacts.manifest, location, sqft, bath, bhk);
    let batch = features.insert_axis(Axis(0));
    let estimates = artifacts.model.predict(batch.view())?;
    Ok(round2(estimates[0]))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{ArtifactStore, ColumnManifest};
    use crate::regression::LinearModel;
    use std::fs;
    use tempfile::TempDir;

    fn store_with(manifest: &ColumnManifest, model: &LinearModel) -> (TempDir, ArtifactStore) {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(store.columns_path(), serde_json::to_string(manifest).unwrap()).unwrap();
        fs::write(store.model_path(), serde_json::to_string(model).unwrap()).unwrap();
        (dir, store)
    }

    fn test_manifest() -> ColumnManifest {
        ColumnManifest::from_columns(
            ["total_sqft", "bath", "bhk", "indiranagar", "whitefield"]
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn known_location_uses_the_model() {
        let model = LinearModel::new(vec![0.05, 0.0, 0.0, 0.0, 0.0], 0.0);
        let (_dir, store) = store_with(&test_manifest(), &model);
        let estimate = estimate_price(&store, "Indiranagar", 1200.0, 2, 2);
        assert_eq!(estimate, PriceEstimate::Model(60.0));
        assert!(!estimate.is_fallback());
    }

    #[test]
    fn unknown_location_still_yields_a_model_estimate() {
        let model = LinearModel::new(vec![0.05, 0.0, 0.0, 10.0, 10.0], 0.0);
        let (_dir, store) = store_with(&test_manifest(), &model);
        let estimate = estimate_price(&store, "koramangala", 1200.0, 2, 2);
        assert_eq!(estimate, PriceEstimate::Model(60.0));
    }

    #[test]
    fn feature_width_mismatch_degrades_to_the_fallback_range() {
        // Model narrower than the manifest, as a stale artifact would be.
        let model = LinearModel::new(vec![0.05, 0.0, 0.0], 0.0);
        let (_dir, store) = store_with(&test_manifest(), &model);
        let estimate = estimate_price(&store, "Indiranagar", 1200.0, 2, 2);
        assert!(estimate.is_fallback());
        let price = estimate.value();
        assert!((50.0..150.0).contains(&price));
        assert_eq!(price, round2(price));
    }

    #[test]
    fn estimates_are_rounded_to_two_decimals() {
        let model = LinearModel::new(vec![0.0333, 0.0, 0.0, 0.0, 0.0], 0.0);
        let (_dir, store) = store_with(&test_manifest(), &model);
        let estimate = estimate_price(&store, "Indiranagar", 1000.0, 2, 2);
        assert_eq!(estimate, PriceEstimate::Model(33.3));
    }

    #[test]
    fn round2_snaps_to_cents() {
        assert_eq!(round2(33.333), 33.33);
        assert_eq!(round2(59.996), 60.0);
    }
}

use ndarray::Array1;
use tracing::debug;

use crate::artifacts::ColumnManifest;

/// Builds the model input row for one listing: square footage, bathrooms and
/// bedrooms in the three fixed slots, then a one-hot bit for the location.
///
/// An unknown location leaves every one-hot bit at zero rather than failing;
/// the prediction simply runs without the location signal.
pub fn encode(manifest: &ColumnManifest, location: &str, sqft: f64, bath: i32, bhk: i32) -> Array1<f64> {
    let mut features = Array1::zeros(manifest.len());
    features[0] = sqft;
    features[1] = f64::from(bath);
    features[2] = f64::from(bhk);
    match manifest.location_index(location) {
        Some(index) => features[index] = 1.0,
        None => debug!("location {location:?} not in manifest, encoding without one-hot bit"),
    }
    features
}

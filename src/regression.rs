use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Linear regression model over the manifest's feature layout.
///
/// Each estimate is `intercept + features · coefficients`; the coefficient
/// vector length defines the feature width the model accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self { coefficients, intercept }
    }

    pub fn num_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Runs the model over a batch of feature rows, one estimate per row.
    pub fn predict(&self, batch: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if batch.ncols() != self.coefficients.len() {
            return Err(ServiceError::FeatureWidth {
                expected: self.coefficients.len(),
                actual: batch.ncols(),
            });
        }
        let weights = ArrayView1::from(self.coefficients.as_slice());
        Ok(batch.dot(&weights) + self.intercept)
    }

    /// Ordinary least squares of price against square footage alone, widened
    /// to `width` columns with the slope at the `total_sqft` position.
    pub fn fit_sqft_baseline(samples: &[(f64, f64)], width: usize) -> Self {
        let n = samples.len() as f64;
        let mean_x = samples.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = samples.iter().map(|(_, y)| y).sum::<f64>() / n;
        let mut covariance = 0.0;
        let mut variance = 0.0;
        for (x, y) in samples {
            covariance += (x - mean_x) * (y - mean_y);
            variance += (x - mean_x) * (x - mean_x);
        }
        let slope = if variance == 0.0 { 0.0 } else { covariance / variance };
        let intercept = mean_y - slope * mean_x;

        let mut coefficients = vec![0.0; width];
        if let Some(first) = coefficients.first_mut() {
            *first = slope;
        }
        Self { coefficients, intercept }
    }

    /// Repair model fitted from three synthetic listings, so a fresh checkout
    /// without a trained model can still answer predictions.
    pub fn synthetic(width: usize) -> Self {
        const TRAINING: [(f64, f64); 3] = [(1000.0, 50.0), (1500.0, 75.0), (2000.0, 100.0)];
        Self::fit_sqft_baseline(&TRAINING, width)
    }
}

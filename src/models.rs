use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, ServiceError};

/// Prediction request payload, shared by the JSON and form bodies.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub total_sqft: f64,
    pub location: String,
    pub bhk: i32,
    pub bath: i32,
}

impl PredictRequest {
    /// Builds a request from text form fields (multipart or urlencoded).
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            total_sqft: parse_field(fields, "total_sqft")?,
            location: fields
                .get("location")
                .cloned()
                .ok_or_else(|| missing_field("location"))?,
            bhk: parse_field(fields, "bhk")?,
            bath: parse_field(fields, "bath")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.total_sqft > 0.0) {
            return Err(ServiceError::validation(
                "Invalid input parameters: total_sqft must be greater than zero",
            ));
        }
        if self.bhk <= 0 {
            return Err(ServiceError::validation(
                "Invalid input parameters: bhk must be greater than zero",
            ));
        }
        if self.bath <= 0 {
            return Err(ServiceError::validation(
                "Invalid input parameters: bath must be greater than zero",
            ));
        }
        if self.location.trim().is_empty() {
            return Err(ServiceError::validation(
                "Invalid input parameters: location cannot be empty",
            ));
        }
        Ok(())
    }
}

fn parse_field<T>(fields: &HashMap<String, String>, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = fields.get(name).ok_or_else(|| missing_field(name))?;
    raw.trim()
        .parse()
        .map_err(|err| ServiceError::validation(format!("Invalid input parameters: {name}: {err}")))
}

fn missing_field(name: &str) -> ServiceError {
    ServiceError::validation(format!("Missing input parameters: {name}"))
}

#[derive(Debug, Serialize)]
pub struct LocationsResponse {
    pub locations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub estimated_price: f64,
}

/// Error body shared by 400 and 500 responses; `estimated_price` carries the
/// literal string "Error" so the frontend can tell it from a number.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub estimated_price: &'static str,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), estimated_price: "Error" }
    }
}

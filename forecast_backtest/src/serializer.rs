//! Turning fitted model state into portable bytes

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Serializes a fitted model into an opaque blob stored with each result
pub trait ModelSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, state: &T) -> Result<Vec<u8>>;
}

/// JSON encoding of the fitted state
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl ModelSerializer for JsonSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, state: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(state).map_err(|e| ForecastError::SerializationError(e.to_string()))
    }
}

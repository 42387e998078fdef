//! Forecasting through a hosted inference service
//!
//! Foundation models are not trained locally: fitting only captures the
//! context window that will be sent with each request.

use crate::error::{ForecastError, Result};
use crate::models::UnivariateModel;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

/// Client of a hosted forecasting service
pub trait InferenceClient: Debug {
    /// Endpoint or model identifier the client talks to
    fn endpoint(&self) -> &str;

    /// Forecast `horizon` values following `context` (oldest first)
    fn forecast(&self, context: &[f64], horizon: usize) -> Result<Vec<f64>>;
}

/// Model capability backed by an [`InferenceClient`].
///
/// Timeouts and retries belong to the client; a failed request fails the
/// window that issued it.
#[derive(Debug, Clone)]
pub struct RemoteModel<C> {
    name: String,
    client: C,
    max_context: Option<usize>,
}

/// What a remote "fit" captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteState {
    pub endpoint: String,
    pub context: Vec<f64>,
}

impl<C: InferenceClient> RemoteModel<C> {
    pub fn new(client: C) -> Self {
        Self {
            name: format!("Remote({})", client.endpoint()),
            client,
            max_context: None,
        }
    }

    /// Only send the most recent `max_context` observations
    pub fn with_max_context(mut self, max_context: usize) -> Self {
        self.max_context = Some(max_context);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: InferenceClient> UnivariateModel for RemoteModel<C> {
    type State = RemoteState;

    fn model_name(&self) -> &str {
        &self.name
    }

    fn train(&self, values: &[f64]) -> Result<Self::State> {
        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Empty time series data".to_string(),
            ));
        }

        let start = self
            .max_context
            .map_or(0, |max| values.len().saturating_sub(max));

        Ok(RemoteState {
            endpoint: self.client.endpoint().to_string(),
            context: values[start..].to_vec(),
        })
    }

    fn project(&self, state: &Self::State, horizon: usize) -> Result<Vec<f64>> {
        debug!(
            endpoint = %state.endpoint,
            context = state.context.len(),
            horizon,
            "Requesting remote forecast"
        );

        let values = self.client.forecast(&state.context, horizon)?;
        if values.len() != horizon {
            return Err(ForecastError::ModelError(format!(
                "Endpoint {} returned {} values for a horizon of {}",
                state.endpoint,
                values.len(),
                horizon
            )));
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct LastValueClient;

    impl InferenceClient for LastValueClient {
        fn endpoint(&self) -> &str {
            "last-value"
        }

        fn forecast(&self, context: &[f64], horizon: usize) -> Result<Vec<f64>> {
            let last = context.last().copied().unwrap_or_default();
            Ok(vec![last; horizon])
        }
    }

    #[derive(Debug)]
    struct ShortClient;

    impl InferenceClient for ShortClient {
        fn endpoint(&self) -> &str {
            "short"
        }

        fn forecast(&self, _context: &[f64], _horizon: usize) -> Result<Vec<f64>> {
            Ok(vec![1.0])
        }
    }

    #[test]
    fn test_context_is_trimmed() {
        let model = RemoteModel::new(LastValueClient).with_max_context(2);
        let state = model.train(&[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(state.context, vec![2.0, 3.0]);
        assert_eq!(state.endpoint, "last-value");
        assert_eq!(model.project(&state, 2).unwrap(), vec![3.0, 3.0]);
        assert_eq!(model.name(), "Remote(last-value)");
    }

    #[test]
    fn test_wrong_length_response_is_model_error() {
        let model = RemoteModel::new(ShortClient);
        let state = model.train(&[1.0, 2.0]).unwrap();

        assert!(matches!(
            model.project(&state, 3),
            Err(ForecastError::ModelError(_))
        ));
    }
}

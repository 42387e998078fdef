//! Interfaces to the model registry and serving platform
//!
//! Backtested models are registered as serialized blobs and served behind
//! named endpoints. The backends themselves live outside this crate; only
//! the contracts and an in-memory registry are provided here.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// A registered model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub name: String,
    pub version: u32,
    pub blob: Vec<u8>,
    pub tags: HashMap<String, String>,
}

/// Stores model versions by name
pub trait ModelRegistry {
    /// Store a new version of `name` and return its number. Versions start
    /// at 1 and increase by one per registration.
    fn register(&mut self, name: &str, blob: Vec<u8>, tags: HashMap<String, String>) -> Result<u32>;

    fn get(&self, name: &str, version: u32) -> Result<&RegisteredModel>;

    fn latest(&self, name: &str) -> Result<&RegisteredModel>;
}

/// Registry kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    models: HashMap<String, Vec<RegisteredModel>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of versions stored for `name`
    pub fn versions(&self, name: &str) -> usize {
        self.models.get(name).map_or(0, Vec::len)
    }
}

impl ModelRegistry for InMemoryRegistry {
    fn register(&mut self, name: &str, blob: Vec<u8>, tags: HashMap<String, String>) -> Result<u32> {
        if name.trim().is_empty() {
            return Err(ForecastError::PlatformError(
                "Model name must not be empty".to_string(),
            ));
        }

        let versions = self.models.entry(name.to_string()).or_default();
        let version = versions.len() as u32 + 1;
        versions.push(RegisteredModel {
            name: name.to_string(),
            version,
            blob,
            tags,
        });

        info!(model = name, version, "Registered model");
        Ok(version)
    }

    fn get(&self, name: &str, version: u32) -> Result<&RegisteredModel> {
        self.models
            .get(name)
            .and_then(|versions| versions.iter().find(|m| m.version == version))
            .ok_or_else(|| {
                ForecastError::PlatformError(format!("Model {} version {} not found", name, version))
            })
    }

    fn latest(&self, name: &str) -> Result<&RegisteredModel> {
        self.models
            .get(name)
            .and_then(|versions| versions.last())
            .ok_or_else(|| ForecastError::PlatformError(format!("Model {} not found", name)))
    }
}

/// Lifecycle state of a serving endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointState {
    Pending,
    Ready,
    Failed(String),
}

/// Client of the serving platform
pub trait ServingClient {
    fn create_endpoint(&mut self, name: &str, model: &str, version: u32) -> Result<()>;

    /// Point an existing endpoint at another model version. The endpoint
    /// reports [`EndpointState::Pending`] until the new version is served.
    fn update_endpoint(&mut self, name: &str, model: &str, version: u32) -> Result<()>;

    fn has_endpoint(&self, name: &str) -> Result<bool>;

    fn endpoint_state(&self, name: &str) -> Result<EndpointState>;

    fn delete_endpoint(&mut self, name: &str) -> Result<()>;
}

/// What [`deploy_model`] did to the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Created,
    Updated,
}

/// How often and how long to poll an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 60,
        }
    }
}

/// Poll until the endpoint is ready.
///
/// Returns the number of polls it took. A failed endpoint or running out of
/// attempts is a platform error.
pub fn wait_for_endpoint<C: ServingClient + ?Sized>(
    client: &C,
    name: &str,
    policy: PollPolicy,
) -> Result<u32> {
    for attempt in 1..=policy.max_attempts {
        match client.endpoint_state(name)? {
            EndpointState::Ready => {
                info!(endpoint = name, attempt, "Endpoint ready");
                return Ok(attempt);
            }
            EndpointState::Failed(reason) => {
                return Err(ForecastError::PlatformError(format!(
                    "Endpoint {} failed: {}",
                    name, reason
                )));
            }
            EndpointState::Pending => {
                debug!(endpoint = name, attempt, "Endpoint not ready yet");
                if attempt < policy.max_attempts {
                    thread::sleep(policy.interval);
                }
            }
        }
    }

    Err(ForecastError::PlatformError(format!(
        "Endpoint {} not ready after {} attempts",
        name, policy.max_attempts
    )))
}

/// Serve `model` at `version` behind `name` and wait until it is ready.
///
/// An existing endpoint is updated in place; otherwise a new one is created.
pub fn deploy_model<C: ServingClient + ?Sized>(
    client: &mut C,
    name: &str,
    model: &str,
    version: u32,
    policy: PollPolicy,
) -> Result<Deployment> {
    let deployment = if client.has_endpoint(name)? {
        info!(endpoint = name, model, version, "Updating endpoint");
        client.update_endpoint(name, model, version)?;
        Deployment::Updated
    } else {
        info!(endpoint = name, model, version, "Creating endpoint");
        client.create_endpoint(name, model, version)?;
        Deployment::Created
    };

    wait_for_endpoint(&*client, name, policy)?;
    Ok(deployment)
}

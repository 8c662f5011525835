use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::tax_api::{ApiError, TaxApi};

/// Backend-agnostic API configuration.
///
/// `backend` must match the [`ApiFactory::backend_name`] of a registered
/// factory. `endpoint` is passed through to that factory unchanged; its
/// meaning is backend-specific.
///
/// | backend  | endpoint examples                          |
/// |----------|--------------------------------------------|
/// | `http`   | `https://api.example.com/v1`               |
/// | `memory` | path to a standard deduction CSV, or empty |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"http"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub endpoint: String,
    /// Request timeout for network backends.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            endpoint: "http://localhost:8000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

/// One implementation per API backend. Each backend crate exports a unit
/// struct that implements this trait and is registered with an
/// [`ApiRegistry`] at startup.
#[async_trait]
pub trait ApiFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Build a ready-to-use client for `config`.
    async fn create(&self, config: &ApiConfig) -> Result<Box<dyn TaxApi>, ApiError>;
}

/// Registry of [`ApiFactory`] instances, keyed by backend name.
pub struct ApiRegistry {
    factories: HashMap<&'static str, Box<dyn ApiFactory>>,
}

impl ApiRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory.
    ///
    /// If a factory with the same [`ApiFactory::backend_name`] is already
    /// present it is silently replaced.
    pub fn register(&mut self, factory: Box<dyn ApiFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend` and return
    /// the client it produces.
    ///
    /// # Errors
    /// * [`ApiError::Configuration`] when no factory is registered for the
    ///   requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(&self, config: &ApiConfig) -> Result<Box<dyn TaxApi>, ApiError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                ApiError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        tracing::debug!(backend = factory.backend_name(), endpoint = %config.endpoint, "creating API client");
        factory.create(config).await
    }
}

impl Default for ApiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Directions providers.
//!
//! A provider returns the raw route alternatives between two places as
//! untyped JSON; typing and validation happen in the analyzer so one bad
//! alternative cannot sink the others.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use busmate_core::config::DirectionsConfig;
use busmate_core::error::{BusmateError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Source of raw transit route alternatives.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Look up transit alternatives leaving at `departure`.
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        departure: DateTime<Utc>,
    ) -> Result<Vec<Value>>;
}

#[async_trait]
impl<P: DirectionsProvider + ?Sized> DirectionsProvider for Box<P> {
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        departure: DateTime<Utc>,
    ) -> Result<Vec<Value>> {
        (**self).directions(origin, destination, departure).await
    }
}

// =============================================================================
// Response envelope
// =============================================================================

#[derive(Debug, Deserialize)]
struct DirectionsEnvelope {
    status: String,
    #[serde(default)]
    routes: Vec<Value>,
    #[serde(default)]
    error_message: Option<String>,
}

impl DirectionsEnvelope {
    fn into_routes(self) -> Result<Vec<Value>> {
        match self.status.as_str() {
            "OK" => Ok(self.routes),
            "ZERO_RESULTS" | "NOT_FOUND" => Ok(Vec::new()),
            status => Err(BusmateError::Directions(match self.error_message {
                Some(msg) => format!("{}: {}", status, msg),
                None => status.to_string(),
            })),
        }
    }
}

/// Extract the route list from a saved directions document.
///
/// Accepts either the provider's full response object or a bare array of
/// routes.
pub fn routes_from_document(document: Value) -> Result<Vec<Value>> {
    match document {
        Value::Array(routes) => Ok(routes),
        other => serde_json::from_value::<DirectionsEnvelope>(other)?.into_routes(),
    }
}

// =============================================================================
// Google Directions
// =============================================================================

/// Google Directions API client restricted to transit itineraries.
pub struct GoogleDirectionsClient {
    client: reqwest::Client,
    config: DirectionsConfig,
    api_key: String,
}

impl GoogleDirectionsClient {
    pub fn new(config: DirectionsConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_key: api_key.into(),
        }
    }

    /// Build a client with the key read from the configured environment
    /// variable.
    pub fn from_env(config: DirectionsConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            BusmateError::Config(format!("{} is not set", config.api_key_env))
        })?;
        Ok(Self::new(config, api_key))
    }

    pub fn config(&self) -> &DirectionsConfig {
        &self.config
    }
}

#[async_trait]
impl DirectionsProvider for GoogleDirectionsClient {
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        departure: DateTime<Utc>,
    ) -> Result<Vec<Value>> {
        let departure_time = departure.timestamp().to_string();
        let params = [
            ("origin", origin),
            ("destination", destination),
            ("mode", "transit"),
            ("transit_mode", self.config.transit_mode.as_str()),
            ("departure_time", departure_time.as_str()),
            ("alternatives", "true"),
            ("language", self.config.language.as_str()),
            ("key", self.api_key.as_str()),
        ];

        tracing::debug!(origin, destination, "Requesting transit directions");

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| BusmateError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| BusmateError::Http(e.to_string()))?;

        let envelope: DirectionsEnvelope = response
            .json()
            .await
            .map_err(|e| BusmateError::Directions(format!("unreadable response: {}", e)))?;

        let routes = envelope.into_routes()?;
        tracing::info!(routes = routes.len(), "Directions received");
        Ok(routes)
    }
}

// =============================================================================
// Offline providers
// =============================================================================

/// Replays a directions response saved on disk.
#[derive(Debug, Clone)]
pub struct FileDirections {
    path: PathBuf,
}

impl FileDirections {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectionsProvider for FileDirections {
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        _departure: DateTime<Utc>,
    ) -> Result<Vec<Value>> {
        tracing::debug!(
            path = %self.path.display(),
            origin,
            destination,
            "Replaying saved directions"
        );
        let content = read_saved(&self.path)?;
        routes_from_document(serde_json::from_str(&content)?)
    }
}

fn read_saved(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        BusmateError::Directions(format!("cannot read {}: {}", path.display(), e))
    })
}

/// Returns a fixed answer, counting how often it was asked.
#[derive(Debug)]
pub struct StaticDirections {
    answer: std::result::Result<Vec<Value>, String>,
    calls: AtomicUsize,
}

impl StaticDirections {
    /// Always answer with these routes.
    pub fn routes(routes: Vec<Value>) -> Self {
        Self {
            answer: Ok(routes),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail with this reason.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            answer: Err(reason.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectionsProvider for StaticDirections {
    async fn directions(
        &self,
        _origin: &str,
        _destination: &str,
        _departure: DateTime<Utc>,
    ) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(BusmateError::Directions)
    }
}

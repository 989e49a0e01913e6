use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Warm-up application name cannot be empty")]
    EmptyApplication,
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Config backend holding the published per-application metadata documents
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MetadataStoreConfig {
    /// Base URL; documents live under `<url>/<application>`
    ///
    /// Note: Uses the `url::Url` type so invalid URLs are rejected during
    /// config deserialization.
    pub url: Url,
}

/// Bridge configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for incoming requests
    pub listener: Listener,
    /// Admin listener for health and readiness endpoints
    pub admin_listener: Listener,
    /// Config backend to fetch published metadata from
    pub metadata_store: MetadataStoreConfig,
    /// Applications whose tables are populated at startup instead of on the
    /// first request that names them
    #[serde(default)]
    pub warm_up: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        for application in &self.warm_up {
            if application.is_empty() {
                return Err(ValidationError::EmptyApplication);
            }
        }

        Ok(())
    }
}

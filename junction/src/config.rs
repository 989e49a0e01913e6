use bridge::config::{Config as BridgeConfig, MetadataStoreConfig};
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;

#[derive(Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize)]
pub struct LoggingConfig {
    /// tracing env-filter directives, e.g. "info" or "metadata=debug,info"
    pub filter: String,
}

#[derive(Deserialize)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Deserialize)]
pub struct PublishConfig {
    /// Application name the metadata set is published under
    pub application: String,
    /// JSON document listing the exported services' REST metadata
    pub metadata_file: PathBuf,
    pub metadata_store: MetadataStoreConfig,
}

#[derive(Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub bridge: Option<BridgeConfig>,
    pub publish: Option<PublishConfig>,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

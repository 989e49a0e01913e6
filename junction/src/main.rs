mod config;

use clap::{Parser, Subcommand};
use config::{Config, LoggingConfig, MetricsConfig};
use metadata::registry::MetadataPublisher;
use metadata::repository::MetadataRepository;
use metadata::service::ServiceRestMetadata;
use metadata::store::HttpMetadataStore;
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "junction", about = "REST-to-RPC metadata gateway")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "junction.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the HTTP bridge
    Bridge,
    /// Publish exported REST metadata to the config backend, then exit
    Publish,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.common.logging.as_ref());
    if let Some(metrics_config) = &config.common.metrics {
        install_metrics(metrics_config);
    }

    let result = match cli.command {
        CliCommand::Bridge => run_bridge(config).await,
        CliCommand::Publish => run_publish(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run_bridge(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let Some(bridge_config) = config.bridge else {
        return Err("missing `bridge` section in config".into());
    };
    bridge_config.validate()?;

    shared::metrics_defs::register_all(metadata::metrics_defs::ALL_METRICS);

    let store = Arc::new(HttpMetadataStore::new(
        bridge_config.metadata_store.url.as_str(),
    ));
    let repository = Arc::new(MetadataRepository::new(store));

    bridge::run(bridge_config, repository).await?;
    Ok(())
}

async fn run_publish(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let Some(publish_config) = config.publish else {
        return Err("missing `publish` section in config".into());
    };

    let document = std::fs::read(&publish_config.metadata_file)?;
    let services: Vec<ServiceRestMetadata> = serde_json::from_slice(&document)?;

    let store = Arc::new(HttpMetadataStore::new(
        publish_config.metadata_store.url.as_str(),
    ));
    let publisher = MetadataPublisher::new(store);
    for service in services {
        publisher.record(service);
    }
    publisher.publish(&publish_config.application).await?;

    Ok(())
}

fn init_logging(config: Option<&LoggingConfig>) {
    let default_filter = config
        .map(|logging| logging.filter.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn install_metrics(config: &MetricsConfig) {
    let recorder = match StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some("junction"))
    {
        Ok(recorder) => recorder,
        Err(err) => {
            tracing::warn!(error = %err, "could not build statsd recorder, metrics disabled");
            return;
        }
    };

    if let Err(err) = metrics::set_global_recorder(recorder) {
        tracing::warn!(error = %err, "could not install metrics recorder");
    }
}

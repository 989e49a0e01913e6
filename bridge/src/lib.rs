pub mod config;
pub mod errors;
pub mod service;

use crate::errors::BridgeError;
use crate::service::BridgeService;
use metadata::repository::MetadataRepository;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs the bridge until its listener fails.
///
/// The admin listener comes up first and reports not-ready while the
/// configured applications are warmed up; a warm-up failure is logged and
/// retried lazily on the first request naming that application.
pub async fn run(
    config: config::Config,
    repository: Arc<MetadataRepository>,
) -> Result<(), BridgeError> {
    let ready = Arc::new(AtomicBool::new(false));

    let admin = AdminService::new(Arc::clone(&ready));
    let admin_listener = config.admin_listener.clone();
    tokio::spawn(async move {
        if let Err(err) = run_http_service(&admin_listener.host, admin_listener.port, admin).await {
            tracing::error!(error = %err, "admin listener failed");
        }
    });

    for application in &config.warm_up {
        if let Err(err) = repository.initialize(application).await {
            tracing::warn!(application, error = %err, "warm-up initialization failed");
        }
    }
    ready.store(true, Ordering::Relaxed);

    run_http_service(
        &config.listener.host,
        config.listener.port,
        BridgeService::new(repository),
    )
    .await?;

    Ok(())
}

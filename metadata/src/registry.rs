use crate::service::ServiceRestMetadata;
use crate::store::{MetadataStore, StoreError};
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::sync::Arc;

/// Accumulates the REST metadata of every service this process exports, then
/// pushes the union to the config backend once the application is up.
///
/// Repeated exports of a structurally identical service collapse into one
/// entry; first-export order is preserved for publication.
pub struct MetadataPublisher {
    store: Arc<dyn MetadataStore>,
    exported: Mutex<IndexSet<ServiceRestMetadata>>,
}

impl MetadataPublisher {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        MetadataPublisher {
            store,
            exported: Mutex::new(IndexSet::new()),
        }
    }

    /// Record one service-export notification.
    pub fn record(&self, service: ServiceRestMetadata) {
        let name = service.name.clone();
        let mut exported = self.exported.lock();
        if exported.insert(service) {
            tracing::debug!(service = %name, "recorded exported service");
        } else {
            tracing::debug!(service = %name, "service already recorded, skipping");
        }
    }

    /// Number of distinct services recorded so far.
    pub fn recorded(&self) -> usize {
        self.exported.lock().len()
    }

    /// Push the accumulated set under the application's name.
    pub async fn publish(&self, application: &str) -> Result<(), StoreError> {
        let snapshot: Vec<ServiceRestMetadata> = self.exported.lock().iter().cloned().collect();
        tracing::info!(
            application,
            services = snapshot.len(),
            "publishing exported REST metadata"
        );
        self.store
            .publish_service_rest_metadata(application, &snapshot)
            .await
    }
}

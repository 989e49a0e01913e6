use crate::matcher::{RequestMatcher, RequestView};
use crate::metrics_defs::{MATCH_EXACT, MATCH_FUZZY, MATCH_MISS};
use crate::request::RequestMetadata;
use crate::service::ResolvedEndpoint;
use crate::store::{MetadataStore, StoreError};
use indexmap::IndexMap;
use parking_lot::RwLock;
use shared::counter;
use std::collections::HashMap;
use std::sync::Arc;

type EndpointTable = IndexMap<RequestMatcher, Arc<ResolvedEndpoint>>;

/// Per-application tables from registered operation matchers to the service
/// methods that implement them.
///
/// A table is populated once per application from the metadata published to
/// the config backend and is never refreshed in place: re-initializing a
/// known application is a no-op, so picking up new metadata requires a
/// process restart. Resolution is two-phase: an O(1) structural lookup
/// covers callers holding canonical metadata, and an ordered fuzzy scan
/// covers live traffic whose params and headers are supersets of the
/// declared constraints. The scan visits entries in insertion order and the
/// first accepting matcher wins, so outcomes are stable across runs for the
/// same published input.
pub struct MetadataRepository {
    store: Arc<dyn MetadataStore>,
    tables: RwLock<HashMap<String, Arc<EndpointTable>>>,
}

impl MetadataRepository {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        MetadataRepository {
            store,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch and index the application's published metadata.
    ///
    /// Idempotent: only the first call for an application fetches; later
    /// calls return immediately. An application that published nothing is
    /// not an error (a pure-RPC deployment with no REST surface is normal):
    /// it is logged and left without a table entry, so a later call fetches
    /// again. Fetch failures propagate and likewise commit nothing.
    pub async fn initialize(&self, application: &str) -> Result<(), StoreError> {
        if self.tables.read().contains_key(application) {
            return Ok(());
        }

        let services = self.store.get_service_rest_metadata(application).await?;

        if services.is_empty() {
            tracing::warn!(application, "application does not expose REST metadata");
            return Ok(());
        }

        let mut table = EndpointTable::new();
        for service in services {
            let service = Arc::new(service);
            for operation in &service.meta {
                let matcher = RequestMatcher::new(operation.request.clone());
                let endpoint = Arc::new(ResolvedEndpoint {
                    service: Arc::clone(&service),
                    method: operation.clone(),
                });
                table.insert(matcher, endpoint);
            }
        }

        // First fully-built table wins if two initializers raced; readers
        // only ever observe complete tables.
        self.tables
            .write()
            .entry(application.to_string())
            .or_insert_with(|| Arc::new(table));

        Ok(())
    }

    /// Whether the application already has a committed table.
    pub fn is_initialized(&self, application: &str) -> bool {
        self.tables.read().contains_key(application)
    }

    /// Resolve a request against an application's table. Never fetches: an
    /// application that was not initialized resolves to `None`.
    pub fn get(
        &self,
        application: &str,
        request: &RequestMetadata,
    ) -> Option<Arc<ResolvedEndpoint>> {
        let table = self.tables.read().get(application).cloned()?;

        let probe = RequestMatcher::new(request.clone());
        if let Some(endpoint) = table.get(&probe) {
            counter!(MATCH_EXACT).increment(1);
            return Some(Arc::clone(endpoint));
        }

        let view = RequestView::from(request);
        for (matcher, endpoint) in table.iter() {
            if matcher.matches(&view) {
                counter!(MATCH_FUZZY).increment(1);
                tracing::debug!(
                    application,
                    path = %request.path,
                    pattern = %matcher.metadata().path,
                    "resolved by fuzzy scan"
                );
                return Some(Arc::clone(endpoint));
            }
        }

        counter!(MATCH_MISS).increment(1);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpMethod;
    use crate::service::{MethodMetadata, RestMethodMetadata, ServiceRestMetadata};
    use crate::store::InMemoryMetadataStore;

    fn operation(method_name: &str, request: RequestMetadata) -> RestMethodMetadata {
        RestMethodMetadata {
            method: MethodMetadata::named(method_name),
            request,
        }
    }

    fn order_service() -> ServiceRestMetadata {
        ServiceRestMetadata::new("com.example.OrderService")
            .with_operation(operation(
                "getOrder",
                RequestMetadata::new(HttpMethod::Get, "/orders/{id}"),
            ))
            .with_operation(operation(
                "listOrders",
                RequestMetadata::new(HttpMethod::Get, "/orders"),
            ))
    }

    async fn repository_with(
        application: &str,
        services: Vec<ServiceRestMetadata>,
    ) -> (MetadataRepository, Arc<InMemoryMetadataStore>) {
        let store = Arc::new(InMemoryMetadataStore::new());
        store
            .publish_service_rest_metadata(application, &services)
            .await
            .unwrap();
        (MetadataRepository::new(store.clone()), store)
    }

    #[tokio::test]
    async fn uninitialized_application_never_resolves() {
        let (repository, store) = repository_with("orders-app", vec![order_service()]).await;

        let request = RequestMetadata::new(HttpMethod::Get, "/orders/42");
        assert!(repository.get("orders-app", &request).is_none());
        // get never reaches for the store on its own
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let (repository, store) = repository_with("orders-app", vec![order_service()]).await;

        repository.initialize("orders-app").await.unwrap();
        repository.initialize("orders-app").await.unwrap();

        assert_eq!(store.fetch_count(), 1);
        let request = RequestMetadata::new(HttpMethod::Get, "/orders");
        assert!(repository.get("orders-app", &request).is_some());
    }

    #[tokio::test]
    async fn empty_fetch_commits_nothing_and_retries() {
        let store = Arc::new(InMemoryMetadataStore::new());
        let repository = MetadataRepository::new(store.clone());

        repository.initialize("silent-app").await.unwrap();
        assert!(!repository.is_initialized("silent-app"));

        // A later publication becomes visible because no key was committed.
        store
            .publish_service_rest_metadata("silent-app", &[order_service()])
            .await
            .unwrap();
        repository.initialize("silent-app").await.unwrap();

        assert_eq!(store.fetch_count(), 2);
        assert!(repository.is_initialized("silent-app"));
    }

    #[tokio::test]
    async fn resolves_path_variables_through_the_fuzzy_scan() {
        let (repository, _store) = repository_with("orders-app", vec![order_service()]).await;
        repository.initialize("orders-app").await.unwrap();

        let request = RequestMetadata::new(HttpMethod::Get, "/orders/42");
        let endpoint = repository.get("orders-app", &request).unwrap();

        assert_eq!(endpoint.method.method.name, "getOrder");
        assert_eq!(endpoint.service.name, "com.example.OrderService");
    }

    #[tokio::test]
    async fn exact_match_wins_over_earlier_fuzzy_entry() {
        // Sorted by method name, the template entry lands first in the table.
        let service = ServiceRestMetadata::new("svc")
            .with_operation(operation(
                "getOrderById",
                RequestMetadata::new(HttpMethod::Get, "/orders/{id}"),
            ))
            .with_operation(operation(
                "getOrderFortyTwo",
                RequestMetadata::new(HttpMethod::Get, "/orders/42"),
            ));
        let (repository, _store) = repository_with("orders-app", vec![service]).await;
        repository.initialize("orders-app").await.unwrap();

        let request = RequestMetadata::new(HttpMethod::Get, "/orders/42");
        let endpoint = repository.get("orders-app", &request).unwrap();

        assert_eq!(endpoint.method.method.name, "getOrderFortyTwo");
    }

    #[tokio::test]
    async fn fuzzy_ties_resolve_to_the_first_inserted() {
        // Two services whose templates both accept GET /orders/7/items; the
        // store's document order decides which one the scan reaches first.
        let first = ServiceRestMetadata::new("first").with_operation(operation(
            "listItems",
            RequestMetadata::new(HttpMethod::Get, "/orders/{id}/items"),
        ));
        let second = ServiceRestMetadata::new("second").with_operation(operation(
            "getSection",
            RequestMetadata::new(HttpMethod::Get, "/orders/{id}/{section}"),
        ));
        let (repository, _store) =
            repository_with("orders-app", vec![first, second]).await;
        repository.initialize("orders-app").await.unwrap();

        let request = RequestMetadata::new(HttpMethod::Get, "/orders/7/items");
        let endpoint = repository.get("orders-app", &request).unwrap();

        assert_eq!(endpoint.service.name, "first");
        assert_eq!(endpoint.method.method.name, "listItems");
    }

    #[tokio::test]
    async fn applications_are_isolated() {
        let store = Arc::new(InMemoryMetadataStore::new());
        store
            .publish_service_rest_metadata("app-a", &[order_service()])
            .await
            .unwrap();
        let billing = ServiceRestMetadata::new("com.example.BillingService").with_operation(
            operation(
                "getInvoice",
                RequestMetadata::new(HttpMethod::Get, "/invoices/{id}"),
            ),
        );
        store
            .publish_service_rest_metadata("app-b", &[billing])
            .await
            .unwrap();

        let repository = MetadataRepository::new(store);
        repository.initialize("app-a").await.unwrap();
        repository.initialize("app-b").await.unwrap();

        let invoice = RequestMetadata::new(HttpMethod::Get, "/invoices/9");
        assert!(repository.get("app-a", &invoice).is_none());
        assert!(repository.get("app-b", &invoice).is_some());
    }

    #[tokio::test]
    async fn concurrent_reads_survive_initialization_of_other_applications() {
        let store = Arc::new(InMemoryMetadataStore::new());
        store
            .publish_service_rest_metadata("app-a", &[order_service()])
            .await
            .unwrap();
        store
            .publish_service_rest_metadata("app-b", &[order_service()])
            .await
            .unwrap();

        let repository = Arc::new(MetadataRepository::new(store));
        repository.initialize("app-a").await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let repository = Arc::clone(&repository);
            tasks.push(tokio::spawn(async move {
                for _ in 0..100 {
                    let request = RequestMetadata::new(HttpMethod::Get, "/orders/42");
                    assert!(repository.get("app-a", &request).is_some());
                }
            }));
        }
        let initializer = {
            let repository = Arc::clone(&repository);
            tokio::spawn(async move { repository.initialize("app-b").await })
        };

        for task in tasks {
            task.await.unwrap();
        }
        initializer.await.unwrap().unwrap();
        assert!(repository.is_initialized("app-b"));
    }

    #[tokio::test]
    async fn racing_initializers_leave_a_usable_table() {
        let store = Arc::new(InMemoryMetadataStore::new());
        store
            .publish_service_rest_metadata("orders-app", &[order_service()])
            .await
            .unwrap();

        let repository = Arc::new(MetadataRepository::new(store));
        let mut racers = Vec::new();
        for _ in 0..4 {
            let repository = Arc::clone(&repository);
            racers.push(tokio::spawn(
                async move { repository.initialize("orders-app").await },
            ));
        }
        for racer in racers {
            racer.await.unwrap().unwrap();
        }

        let request = RequestMetadata::new(HttpMethod::Get, "/orders/42");
        assert!(repository.get("orders-app", &request).is_some());
    }
}

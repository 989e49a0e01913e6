use crate::service::ServiceRestMetadata;
use async_trait::async_trait;
use http::StatusCode;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("metadata backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("metadata backend returned unexpected status: {0}")]
    UnexpectedStatus(StatusCode),
}

/// Config/registry channel carrying published REST metadata, keyed by
/// application name.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// One-shot push of an application's accumulated REST metadata.
    async fn publish_service_rest_metadata(
        &self,
        application: &str,
        metadata: &[ServiceRestMetadata],
    ) -> Result<(), StoreError>;

    /// Fetch an application's published REST metadata. An application that
    /// never published anything is an empty result, not an error.
    async fn get_service_rest_metadata(
        &self,
        application: &str,
    ) -> Result<Vec<ServiceRestMetadata>, StoreError>;
}

/// Store backed by an HTTP config service. Documents are JSON arrays of
/// [`ServiceRestMetadata`], addressed by application name under the base URL.
pub struct HttpMetadataStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMetadataStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpMetadataStore {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn document_url(&self, application: &str) -> String {
        format!("{}/{}", self.base_url, application)
    }
}

#[async_trait]
impl MetadataStore for HttpMetadataStore {
    async fn publish_service_rest_metadata(
        &self,
        application: &str,
        metadata: &[ServiceRestMetadata],
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.document_url(application))
            .json(&metadata)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::UnexpectedStatus(response.status()));
        }
        Ok(())
    }

    async fn get_service_rest_metadata(
        &self,
        application: &str,
    ) -> Result<Vec<ServiceRestMetadata>, StoreError> {
        let response = self
            .client
            .get(self.document_url(application))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status => Err(StoreError::UnexpectedStatus(status)),
        }
    }
}

/// Process-local store for tests and single-process setups. Tracks how many
/// fetches each caller performed so re-fetch behavior can be observed.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    documents: Mutex<HashMap<String, Vec<ServiceRestMetadata>>>,
    fetches: AtomicUsize,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn publish_service_rest_metadata(
        &self,
        application: &str,
        metadata: &[ServiceRestMetadata],
    ) -> Result<(), StoreError> {
        self.documents
            .lock()
            .insert(application.to_string(), metadata.to_vec());
        Ok(())
    }

    async fn get_service_rest_metadata(
        &self,
        application: &str,
    ) -> Result<Vec<ServiceRestMetadata>, StoreError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .documents
            .lock()
            .get(application)
            .cloned()
            .unwrap_or_default())
    }
}

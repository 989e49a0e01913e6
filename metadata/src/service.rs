use crate::request::RequestMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// One formal parameter of an RPC method, by position.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodParameterMetadata {
    pub index: usize,
    pub name: String,
    pub r#type: String,
}

/// Descriptor of the RPC method backing an exposed operation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<MethodParameterMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

impl MethodMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        MethodMetadata {
            name: name.into(),
            params: Vec::new(),
            return_type: None,
        }
    }
}

/// One exposed operation: how it is reached over REST plus which RPC method
/// services it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RestMethodMetadata {
    pub method: MethodMetadata,
    pub request: RequestMetadata,
}

/// Full REST surface of one exported RPC service, published under the owning
/// application's name.
///
/// `meta` deduplicates structurally equal operations and iterates in a
/// deterministic order, so repeated exports of the same service collapse and
/// downstream indexing is stable across runs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceRestMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub meta: BTreeSet<RestMethodMetadata>,
}

impl ServiceRestMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        ServiceRestMetadata {
            name: name.into(),
            meta: BTreeSet::new(),
        }
    }

    pub fn with_operation(mut self, operation: RestMethodMetadata) -> Self {
        self.meta.insert(operation);
        self
    }
}

/// Successful match result: the exporting service and the one operation whose
/// matcher accepted the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub service: Arc<ServiceRestMetadata>,
    pub method: RestMethodMetadata,
}

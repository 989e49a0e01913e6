use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multi-valued name/value pairs, ordered by name so that equality and
/// hashing do not depend on construction order.
pub type ValuesByName = BTreeMap<String, Vec<String>>;

/// HTTP methods supported for endpoint matching
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

impl TryFrom<&http::Method> for HttpMethod {
    type Error = UnsupportedMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        match method.as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(UnsupportedMethod(other.to_string())),
        }
    }
}

/// Matching criteria of one exposed REST operation: HTTP method, path
/// template, and the declared parameter and header constraints.
///
/// This is both the published wire shape and the exact-lookup key, so
/// equality and hashing are structural over all four fields. Header names are
/// expected lowercase.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestMetadata {
    pub method: HttpMethod,
    /// Path template; may contain `{name}` variable segments and a trailing
    /// `*` accepting any remainder.
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: ValuesByName,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: ValuesByName,
}

impl RequestMetadata {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        RequestMetadata {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(metadata: &RequestMetadata) -> u64 {
        let mut hasher = DefaultHasher::new();
        metadata.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equality_ignores_construction_order() {
        let a = RequestMetadata::new(HttpMethod::Get, "/orders")
            .with_param("page", "1")
            .with_param("size", "20");
        let b = RequestMetadata::new(HttpMethod::Get, "/orders")
            .with_param("size", "20")
            .with_param("page", "1");

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn distinct_constraints_are_unequal() {
        let a = RequestMetadata::new(HttpMethod::Get, "/orders");
        let b = RequestMetadata::new(HttpMethod::Post, "/orders");
        let c = RequestMetadata::new(HttpMethod::Get, "/orders").with_header("accept", "text/plain");

        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn wire_shape() {
        let metadata = RequestMetadata::new(HttpMethod::Get, "/orders/{id}")
            .with_header("accept", "application/json");

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "method": "GET",
                "path": "/orders/{id}",
                "headers": {"accept": ["application/json"]},
            })
        );

        let back: RequestMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, metadata);
    }
}

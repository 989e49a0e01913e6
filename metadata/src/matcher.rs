use crate::path::PathPattern;
use crate::request::{HttpMethod, RequestMetadata, ValuesByName};
use std::hash::{Hash, Hasher};

/// Borrowed view of a live HTTP request, as the front end saw it.
#[derive(Clone, Copy, Debug)]
pub struct RequestView<'a> {
    pub method: HttpMethod,
    pub path: &'a str,
    pub params: &'a ValuesByName,
    pub headers: &'a ValuesByName,
}

impl<'a> From<&'a RequestMetadata> for RequestView<'a> {
    fn from(metadata: &'a RequestMetadata) -> Self {
        RequestView {
            method: metadata.method,
            path: &metadata.path,
            params: &metadata.params,
            headers: &metadata.headers,
        }
    }
}

/// Decides whether a live request satisfies one registered operation.
///
/// Doubles as the exact-lookup key: equality and hashing delegate to the
/// wrapped [`RequestMetadata`], so two matchers collide exactly when their
/// metadata is structurally equal. The `matches` predicate is wider than
/// equality: a request carrying params or headers beyond the declared
/// constraints is still accepted, and path variables match any segment value.
#[derive(Clone, Debug)]
pub struct RequestMatcher {
    metadata: RequestMetadata,
    pattern: PathPattern,
}

impl RequestMatcher {
    pub fn new(metadata: RequestMetadata) -> Self {
        let pattern = PathPattern::parse(&metadata.path);
        RequestMatcher { metadata, pattern }
    }

    pub fn metadata(&self) -> &RequestMetadata {
        &self.metadata
    }

    /// Pure predicate over the request view; holds no state across calls.
    pub fn matches(&self, request: &RequestView<'_>) -> bool {
        request.method == self.metadata.method
            && self.pattern.matches(request.path).is_some()
            && constraints_hold(&self.metadata.params, request.params)
            && constraints_hold(&self.metadata.headers, request.headers)
    }
}

impl PartialEq for RequestMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
    }
}

impl Eq for RequestMatcher {}

impl Hash for RequestMatcher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metadata.hash(state);
    }
}

/// One declared entry per name: `name` requires presence, `!name` requires
/// absence, and each declared non-empty value must appear among the request's
/// values for that name. Request entries beyond the declared ones never
/// disqualify.
fn constraints_hold(declared: &ValuesByName, actual: &ValuesByName) -> bool {
    declared.iter().all(|(name, expected)| {
        if let Some(absent) = name.strip_prefix('!') {
            return !actual.contains_key(absent);
        }
        match actual.get(name) {
            Some(values) => expected
                .iter()
                .all(|want| want.is_empty() || values.iter().any(|have| have == want)),
            None => false,
        }
    })
}

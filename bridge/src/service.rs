use crate::errors::BridgeError;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use metadata::repository::MetadataRepository;
use metadata::request::{HttpMethod, RequestMetadata, ValuesByName};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// HTTP front end that maps each inbound request onto the RPC method that
/// should service it.
///
/// The first path segment names the target application; the remainder is the
/// service path matched against that application's registered operations.
/// The application's table is initialized on first use, so requests naming a
/// not-yet-seen application pay the one-time metadata fetch.
#[derive(Clone)]
pub struct BridgeService {
    repository: Arc<MetadataRepository>,
}

impl BridgeService {
    pub fn new(repository: Arc<MetadataRepository>) -> Self {
        BridgeService { repository }
    }

    /// Resolves a request to its registered endpoint and describes the
    /// outcome in the response.
    pub async fn resolve<B>(
        &self,
        req: &Request<B>,
    ) -> Result<Response<BoxBody<Bytes, BridgeError>>, BridgeError> {
        let Some((application, service_path)) = split_target(req.uri().path()) else {
            return Ok(plain_response(
                StatusCode::NOT_FOUND,
                "missing application segment\n",
            ));
        };

        let Ok(method) = HttpMethod::try_from(req.method()) else {
            return Ok(plain_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "unsupported method\n",
            ));
        };

        let mut request_metadata = RequestMetadata::new(method, service_path);
        request_metadata.params = parse_query(req.uri().query());
        request_metadata.headers = collect_headers(req.headers());

        self.repository.initialize(application).await?;

        match self.repository.get(application, &request_metadata) {
            Some(endpoint) => {
                tracing::debug!(
                    application,
                    service = %endpoint.service.name,
                    method = %endpoint.method.method.name,
                    "resolved endpoint"
                );
                // TODO: hand the endpoint to the RPC client once the
                // invocation transport lands; until then the resolution
                // itself is the response.
                let body = serde_json::to_vec(&MatchResponse {
                    application,
                    service: &endpoint.service.name,
                    method: &endpoint.method.method.name,
                    pattern: &endpoint.method.request.path,
                })?;
                Ok(json_response(StatusCode::OK, body))
            }
            None => {
                tracing::warn!(
                    application,
                    method = method.as_str(),
                    path = service_path,
                    "no operation matched"
                );
                Ok(plain_response(
                    StatusCode::NOT_FOUND,
                    "no operation matches this request\n",
                ))
            }
        }
    }
}

impl Service<Request<Incoming>> for BridgeService {
    type Response = Response<BoxBody<Bytes, BridgeError>>;
    type Error = BridgeError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move {
            match service.resolve(&req).await {
                Ok(response) => Ok(response),
                Err(BridgeError::Store(err)) => {
                    tracing::warn!(error = %err, "metadata store unavailable");
                    Ok(plain_response(
                        StatusCode::BAD_GATEWAY,
                        "metadata store unavailable\n",
                    ))
                }
                Err(err) => Err(err),
            }
        })
    }
}

#[derive(serde::Serialize)]
struct MatchResponse<'a> {
    application: &'a str,
    service: &'a str,
    method: &'a str,
    pattern: &'a str,
}

/// Splits "/{application}/service/path" into the application name and the
/// service path. The service path keeps its leading slash and degrades to
/// "/" when the request names only the application.
fn split_target(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.find('/') {
        Some(0) => None,
        Some(idx) => Some((&trimmed[..idx], &trimmed[idx..])),
        None => Some((trimmed, "/")),
    }
}

fn parse_query(query: Option<&str>) -> ValuesByName {
    let mut params = ValuesByName::new();
    if let Some(query) = query {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    params
}

fn collect_headers(headers: &HeaderMap) -> ValuesByName {
    let mut collected = ValuesByName::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            collected
                .entry(name.as_str().to_string())
                .or_default()
                .push(value.to_string());
        }
    }
    collected
}

fn plain_response(status: StatusCode, body: &'static str) -> Response<BoxBody<Bytes, BridgeError>> {
    let mut response = Response::new(Full::new(Bytes::from(body)).map_err(|e| match e {}).boxed());
    *response.status_mut() = status;
    response
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response<BoxBody<Bytes, BridgeError>> {
    let mut response = Response::new(Full::new(Bytes::from(body)).map_err(|e| match e {}).boxed());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Empty;
    use hyper::Method;
    use metadata::service::{MethodMetadata, RestMethodMetadata, ServiceRestMetadata};
    use metadata::store::{InMemoryMetadataStore, MetadataStore};

    fn order_service() -> ServiceRestMetadata {
        ServiceRestMetadata::new("com.example.OrderService").with_operation(RestMethodMetadata {
            method: MethodMetadata::named("getOrder"),
            request: RequestMetadata::new(HttpMethod::Get, "/orders/{id}"),
        })
    }

    async fn bridge_with(application: &str, services: Vec<ServiceRestMetadata>) -> BridgeService {
        let store = Arc::new(InMemoryMetadataStore::new());
        store
            .publish_service_rest_metadata(application, &services)
            .await
            .unwrap();
        BridgeService::new(Arc::new(MetadataRepository::new(store)))
    }

    fn test_request(method: Method, uri: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Empty::new())
            .unwrap()
    }

    async fn body_json(response: Response<BoxBody<Bytes, BridgeError>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn resolves_a_request_to_its_method() {
        let bridge = bridge_with("orders-app", vec![order_service()]).await;

        let req = test_request(Method::GET, "/orders-app/orders/42");
        let response = bridge.resolve(&req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["application"], "orders-app");
        assert_eq!(body["service"], "com.example.OrderService");
        assert_eq!(body["method"], "getOrder");
        assert_eq!(body["pattern"], "/orders/{id}");
    }

    #[tokio::test]
    async fn unknown_operation_is_not_found() {
        let bridge = bridge_with("orders-app", vec![order_service()]).await;

        let req = test_request(Method::POST, "/orders-app/orders/42");
        let response = bridge.resolve(&req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_application_is_not_found() {
        let bridge = bridge_with("orders-app", vec![order_service()]).await;

        let req = test_request(Method::GET, "/ghost-app/orders/42");
        let response = bridge.resolve(&req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_application_segment_is_not_found() {
        let bridge = bridge_with("orders-app", vec![order_service()]).await;

        let req = test_request(Method::GET, "/");
        let response = bridge.resolve(&req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unsupported_method_is_rejected() {
        let bridge = bridge_with("orders-app", vec![order_service()]).await;

        let req = test_request(Method::TRACE, "/orders-app/orders/42");
        let response = bridge.resolve(&req).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn split_target_variants() {
        assert_eq!(
            split_target("/orders-app/orders/42"),
            Some(("orders-app", "/orders/42"))
        );
        assert_eq!(split_target("/orders-app"), Some(("orders-app", "/")));
        assert_eq!(split_target("/"), None);
    }

    #[test]
    fn query_params_reach_the_matcher() {
        let params = parse_query(Some("page=1&tag=a&tag=b"));
        assert_eq!(params["page"], vec!["1"]);
        assert_eq!(params["tag"], vec!["a", "b"]);
    }
}

use crate::http::make_boxed_error_response;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Operational endpoints served on a component's admin listener.
///
/// `/health` answers liveness unconditionally; `/ready` reports readiness from
/// a flag the owning component flips once its startup work is done.
#[derive(Clone)]
pub struct AdminService {
    ready: Arc<AtomicBool>,
}

impl AdminService {
    pub fn new(ready: Arc<AtomicBool>) -> Self {
        Self { ready }
    }
}

// Generic over the request body: the admin endpoints never read it.
impl<B> Service<Request<B>> for AdminService {
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let ready = self.ready.load(Ordering::Relaxed);
        let path = req.uri().path().to_string();

        Box::pin(async move {
            let ok_body = || Full::new(Bytes::from("ok\n")).boxed();

            let res = match path.as_str() {
                "/health" => Response::new(ok_body()),
                "/ready" if ready => Response::new(ok_body()),
                "/ready" => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
                _ => make_boxed_error_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}

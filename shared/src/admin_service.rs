use crate::http::make_boxed_error_response;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Serves `/health` and `/ready` on the admin listener.
///
/// `/health` answers as long as the process is up; `/ready` asks the
/// `is_ready` callback on every request.
pub struct AdminService<F, E> {
    is_ready: F,
    _error: PhantomData<E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self {
            is_ready,
            _error: PhantomData,
        }
    }

    fn respond(&self, method: &Method, path: &str) -> Response<BoxBody<Bytes, Infallible>> {
        let ok_body = || Full::new(Bytes::from("ok\n")).boxed();

        if method != Method::GET && method != Method::HEAD {
            return make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED);
        }

        match path {
            "/health" => Response::new(ok_body()),
            "/ready" => match (self.is_ready)() {
                true => Response::new(ok_body()),
                false => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
            },
            _ => make_boxed_error_response(StatusCode::NOT_FOUND),
        }
    }
}

impl<F, E> Service<Request<Incoming>> for AdminService<F, E>
where
    F: Fn() -> bool + Send + 'static,
    E: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let res = self.respond(req.method(), req.uri().path());
        Box::pin(async move { Ok(res) })
    }
}

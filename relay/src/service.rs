use crate::body::{Payload, decode_body, decode_form, read_body};
use crate::config::RelayConfig;
use crate::cors::CorsPolicy;
use crate::errors::RelayError;
use crate::forward::{DownstreamResponse, Forwarder, HttpForwarder};
use crate::metrics_defs::{FORWARD_DURATION, REQUESTS};
use crate::normalize::normalize;
use crate::response::{
    Envelope, RelayBody, error_response, json_response, no_content_response, pixel_response,
};
use crate::signature;
use http::request::Parts;
use hyper::body::Incoming;
use hyper::header::ORIGIN;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::{counter, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Relays form submissions to the configured downstream endpoint.
#[derive(Clone)]
pub struct RelayService {
    config: Arc<RelayConfig>,
    cors: Arc<CorsPolicy>,
    forwarder: Arc<dyn Forwarder>,
}

impl RelayService {
    pub fn new(config: RelayConfig) -> Self {
        let forwarder = HttpForwarder::new(config.timeout());
        Self::with_forwarder(config, Arc::new(forwarder))
    }

    pub fn with_forwarder(config: RelayConfig, forwarder: Arc<dyn Forwarder>) -> Self {
        let cors = CorsPolicy::new(&config.cors_origins, config.pixel);
        Self {
            config: Arc::new(config),
            cors: Arc::new(cors),
            forwarder,
        }
    }

    /// Handles one request end to end. Every failure is turned into a response.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<RelayBody>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        let mut response = match parts.method {
            Method::OPTIONS => {
                counter!(REQUESTS, "outcome" => "preflight").increment(1);
                no_content_response()
            }
            Method::POST => self.relay_submission(&parts, body).await,
            Method::GET if self.config.pixel => self.relay_pixel(&parts).await,
            _ => {
                let error = RelayError::MethodNotAllowed;
                tracing::debug!(method = %parts.method, "Rejected method");
                counter!(REQUESTS, "outcome" => error.outcome()).increment(1);
                error_response(&error)
            }
        };

        if !self.cors.apply(&parts.headers, response.headers_mut()) {
            tracing::warn!(
                origin = ?parts.headers.get(ORIGIN),
                "Origin not in CORS allow-list"
            );
        }

        response
    }

    async fn relay_submission<B>(&self, parts: &Parts, body: B) -> Response<RelayBody>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let result = self.process_submission(parts, body).await;

        match result {
            Ok(downstream) => {
                counter!(REQUESTS, "outcome" => "forwarded").increment(1);
                json_response(StatusCode::OK, &Envelope::forwarded(&downstream))
            }
            Err(e) => {
                counter!(REQUESTS, "outcome" => e.outcome()).increment(1);
                match &e {
                    RelayError::MissingDownstream | RelayError::DownstreamRejected { .. } => {
                        tracing::warn!(error = %e, "Submission not relayed")
                    }
                    _ => tracing::error!(error = %e, "Relay failed"),
                }
                error_response(&e)
            }
        }
    }

    async fn process_submission<B>(
        &self,
        parts: &Parts,
        body: B,
    ) -> Result<DownstreamResponse, RelayError>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let raw = read_body(body).await?;

        if let Some(secret) = &self.config.webhook_secret {
            let _ = signature::inspect(secret, &parts.headers, &raw);
        }

        let payload = decode_body(&raw)?;
        tracing::debug!(bytes = raw.len(), keys = payload.len(), "Decoded submission");
        self.forward(payload).await
    }

    // Pixel requests carry their fields in the query string and always get the GIF back.
    async fn relay_pixel(&self, parts: &Parts) -> Response<RelayBody> {
        let payload = decode_form(parts.uri.query().unwrap_or_default());

        match self.forward(payload).await {
            Ok(_) => counter!(REQUESTS, "outcome" => "forwarded").increment(1),
            Err(e) => {
                counter!(REQUESTS, "outcome" => e.outcome()).increment(1);
                tracing::warn!(error = %e, "Pixel submission not relayed");
            }
        }

        pixel_response()
    }

    async fn forward(&self, payload: Payload) -> Result<DownstreamResponse, RelayError> {
        let (payload, contact) = normalize(payload);

        let url = self
            .config
            .downstream_url
            .as_ref()
            .ok_or(RelayError::MissingDownstream)?;

        let start = Instant::now();
        let result = self.forwarder.forward(url, &payload).await;
        let status_tag = match &result {
            Ok(downstream) => downstream.status.as_u16().to_string(),
            Err(_) => "error".to_string(),
        };
        histogram!(FORWARD_DURATION, "status" => status_tag).record(start.elapsed().as_secs_f64());

        let downstream = result?;
        tracing::info!(
            status = downstream.status.as_u16(),
            has_email = !contact.email.is_empty(),
            "Forwarded submission"
        );

        if self.config.strict_downstream && !downstream.status.is_success() {
            return Err(RelayError::DownstreamRejected {
                status: downstream.status,
                text: downstream.text,
            });
        }

        Ok(downstream)
    }
}

impl Service<Request<Incoming>> for RelayService {
    type Response = Response<RelayBody>;
    type Error = RelayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

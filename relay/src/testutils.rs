use crate::body::Payload;
use crate::errors::RelayError;
use crate::forward::{DownstreamResponse, Forwarder};
use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::CONTENT_TYPE;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

#[derive(Clone, Debug)]
pub struct ReceivedRequest {
    pub content_type: Option<String>,
    pub body: Value,
}

/// Local HTTP server standing in for the downstream webhook.
pub struct TestDownstream {
    pub url: Url,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl TestDownstream {
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}

/// Starts a server that records every request and answers with `status` and `reply`.
pub async fn start_downstream(status: StatusCode, reply: &'static str) -> TestDownstream {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to address");
    let port = listener.local_addr().unwrap().port();

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);
            let received = received_clone.clone();

            tokio::spawn(async move {
                let handler = service_fn(move |req: Request<Incoming>| {
                    let received = received.clone();
                    async move {
                        let content_type = req
                            .headers()
                            .get(CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        let bytes = req.into_body().collect().await.unwrap().to_bytes();
                        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

                        received
                            .lock()
                            .unwrap()
                            .push(ReceivedRequest { content_type, body });

                        let mut response = Response::new(Full::new(Bytes::from_static(
                            reply.as_bytes(),
                        )));
                        *response.status_mut() = status;
                        Ok::<_, Infallible>(response)
                    }
                });

                let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(io, handler)
                    .await;
            });
        }
    });

    TestDownstream {
        url: Url::parse(&format!("http://127.0.0.1:{port}/hook")).unwrap(),
        received,
    }
}

/// In-memory forwarder that records payloads instead of sending them.
#[derive(Clone)]
pub struct RecordingForwarder {
    reply: Option<DownstreamResponse>,
    calls: Arc<Mutex<Vec<Payload>>>,
}

impl RecordingForwarder {
    /// Every forward succeeds with `status` and `text`.
    pub fn replying(status: StatusCode, text: &str) -> Self {
        Self {
            reply: Some(DownstreamResponse {
                status,
                text: text.to_string(),
            }),
            calls: Arc::default(),
        }
    }

    /// Every forward fails at the network level.
    pub fn unreachable() -> Self {
        Self {
            reply: None,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Payload> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn forward(
        &self,
        _url: &Url,
        payload: &Payload,
    ) -> Result<DownstreamResponse, RelayError> {
        self.calls.lock().unwrap().push(payload.clone());

        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(RelayError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        }
    }
}

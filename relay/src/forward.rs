use crate::body::Payload;
use crate::errors::RelayError;
use async_trait::async_trait;
use hyper::StatusCode;
use std::time::Duration;
use url::Url;

/// What the downstream endpoint answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub text: String,
}

/// Delivers a normalized payload to the downstream endpoint.
///
/// Implementations make exactly one attempt.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(
        &self,
        url: &Url,
        payload: &Payload,
    ) -> Result<DownstreamResponse, RelayError>;
}

/// Posts payloads as JSON with a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpForwarder {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        url: &Url,
        payload: &Payload,
    ) -> Result<DownstreamResponse, RelayError> {
        let mut request = self.client.post(url.clone()).json(payload);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        Ok(DownstreamResponse { status, text })
    }
}

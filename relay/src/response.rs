use crate::errors::RelayError;
use crate::forward::DownstreamResponse;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;

pub type RelayBody = BoxBody<Bytes, Infallible>;

/// 1x1 transparent GIF returned to pixel requests.
pub const PIXEL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// JSON body returned to POST callers.
#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoho_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoho_text: Option<String>,
}

impl Envelope {
    pub fn forwarded(downstream: &DownstreamResponse) -> Self {
        Envelope {
            ok: true,
            zoho_status: Some(downstream.status.as_u16()),
            zoho_text: Some(downstream.text.clone()),
            ..Default::default()
        }
    }

    pub fn failed(error: &RelayError) -> Self {
        match error {
            RelayError::MethodNotAllowed | RelayError::MissingDownstream => Envelope {
                ok: false,
                error: Some(error.to_string()),
                ..Default::default()
            },
            RelayError::DownstreamRejected { status, text } => Envelope {
                ok: false,
                error: Some("Downstream rejected".into()),
                zoho_status: Some(status.as_u16()),
                zoho_text: Some(text.clone()),
                ..Default::default()
            },
            _ => Envelope {
                ok: false,
                error: Some("Relay failed".into()),
                detail: Some(error.to_string()),
                ..Default::default()
            },
        }
    }
}

pub fn json_response(status: StatusCode, envelope: &Envelope) -> Response<RelayBody> {
    // Serializing a struct of plain fields cannot fail
    let bytes = serde_json::to_vec(envelope).unwrap_or_default();

    let mut response = Response::new(Full::new(Bytes::from(bytes)).boxed());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub fn error_response(error: &RelayError) -> Response<RelayBody> {
    json_response(error.status_code(), &Envelope::failed(error))
}

pub fn pixel_response() -> Response<RelayBody> {
    let mut response = Response::new(Full::new(Bytes::from_static(PIXEL_GIF)).boxed());
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/gif"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

pub fn no_content_response() -> Response<RelayBody> {
    let mut response = Response::new(Empty::new().boxed());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

use crate::errors::RelayError;
use http_body_util::BodyExt;
use hyper::body::Bytes;
use serde_json::{Map, Value};

/// Open key/value mapping received from the form builder.
pub type Payload = Map<String, Value>;

/// Drains a request body completely.
pub async fn read_body<B>(body: B) -> Result<Bytes, RelayError>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| RelayError::RequestBodyError(e.to_string()))
}

/// Decodes a raw submission body.
///
/// Bodies whose first non-whitespace character is `{` are parsed as JSON,
/// everything else as `application/x-www-form-urlencoded`. The content type
/// header is not consulted.
pub fn decode_body(raw: &[u8]) -> Result<Payload, RelayError> {
    let text = String::from_utf8_lossy(raw);

    if text.trim_start().starts_with('{') {
        Ok(serde_json::from_str::<Payload>(&text)?)
    } else {
        Ok(decode_form(&text))
    }
}

/// Parses form or query-string data into a flat string mapping.
///
/// A leading `?` is ignored and the last value wins for repeated keys.
pub fn decode_form(text: &str) -> Payload {
    let text = text.trim();
    let text = text.strip_prefix('?').unwrap_or(text);

    url::form_urlencoded::parse(text.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

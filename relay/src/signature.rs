//! HMAC-SHA256 checks for the form builder's webhook signature.
//!
//! The signature covers the raw request body followed by the submission id
//! header and is sent as `sha256=<hex>`. Checks are advisory: the relay logs
//! and counts the outcome but never rejects a submission because of it.

use crate::metrics_defs::SIGNATURE_MISMATCH;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;
use shared::counter;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "framer-signature";
pub const SUBMISSION_ID_HEADER: &str = "framer-webhook-submission-id";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,
    #[error("invalid signature format: {0}")]
    InvalidFormat(String),
    #[error("signature verification failed")]
    Mismatch,
    #[error("invalid secret key")]
    InvalidSecret,
}

/// Verifies `signature` (`sha256=<hex>`) against `body` and `submission_id`.
pub fn verify_signature(
    secret: &[u8],
    body: &[u8],
    submission_id: &[u8],
    signature: &str,
) -> Result<(), SignatureError> {
    let hex_digest = signature
        .trim()
        .strip_prefix("sha256=")
        .ok_or_else(|| SignatureError::InvalidFormat(signature.to_string()))?;
    let expected =
        hex::decode(hex_digest).map_err(|e| SignatureError::InvalidFormat(e.to_string()))?;

    mac_for(secret, body, submission_id)?
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Computes the `sha256=<hex>` header value for a submission.
pub fn sign(secret: &[u8], body: &[u8], submission_id: &[u8]) -> Result<String, SignatureError> {
    let digest = mac_for(secret, body, submission_id)?.finalize().into_bytes();
    Ok(format!("sha256={}", hex::encode(digest)))
}

/// Checks the signature headers on a request and logs the outcome.
pub fn inspect(secret: &str, headers: &HeaderMap, body: &[u8]) -> Result<(), SignatureError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::Missing);
    let submission_id = headers
        .get(SUBMISSION_ID_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    let result = signature
        .and_then(|sig| verify_signature(secret.as_bytes(), body, submission_id, sig));

    match &result {
        Ok(()) => tracing::debug!("Webhook signature verified"),
        Err(e) => {
            counter!(SIGNATURE_MISMATCH).increment(1);
            tracing::warn!(error = %e, "Webhook signature check failed, relaying anyway");
        }
    }

    result
}

fn mac_for(
    secret: &[u8],
    body: &[u8],
    submission_id: &[u8],
) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(body);
    mac.update(submission_id);
    Ok(mac)
}

use hyper::StatusCode;
use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Errors that can occur while relaying a single submission
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("ZFLOW_URL not set")]
    MissingDownstream,

    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Downstream request failed: {0}")]
    Downstream(#[from] reqwest::Error),

    #[error("Downstream rejected the payload with status {status}")]
    DownstreamRejected { status: StatusCode, text: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Status code reported to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::DownstreamRejected { .. } => StatusCode::BAD_GATEWAY,
            RelayError::MissingDownstream
            | RelayError::RequestBodyError(_)
            | RelayError::InvalidJson(_)
            | RelayError::Downstream(_)
            | RelayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for the `outcome` tag on request metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::MethodNotAllowed => "method_not_allowed",
            RelayError::MissingDownstream => "missing_downstream",
            RelayError::RequestBodyError(_) | RelayError::InvalidJson(_) => "bad_body",
            RelayError::Downstream(_) => "downstream_failed",
            RelayError::DownstreamRejected { .. } => "downstream_rejected",
            RelayError::Io(_) => "io",
        }
    }
}

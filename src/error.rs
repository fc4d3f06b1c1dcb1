//! Service error types.
//!
//! Every failure raised while fetching or processing an image is caught at
//! the request handler boundary and converted into a uniform 500 JSON
//! response, so these variants exist for logging and tests rather than for
//! client-facing detail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Primary URL (and fallback, when present) did not yield a successful
    /// response. Carries the HTTP status text of the last attempt.
    #[error("failed to fetch image: {status}")]
    FetchFailed { status: String },

    /// Input bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    /// A pixel operation (resize, flatten, composite, page selection)
    /// rejected its input.
    #[error("image operation failed: {0}")]
    EngineFailed(String),

    /// Encoding to the output format failed.
    #[error("failed to encode to {format}: {message}")]
    EncodeFailed {
        format: &'static str,
        message: String,
    },

    /// No usable font face could be resolved for text rendering.
    #[error("no usable font for family '{0}'")]
    FontUnavailable(String),

    /// Startup problem (bad HTTP client build, invalid listen address).
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl ServiceError {
    pub fn decode_failed(message: impl Into<String>) -> Self {
        ServiceError::DecodeFailed(message.into())
    }

    pub fn engine_failed(message: impl Into<String>) -> Self {
        ServiceError::EngineFailed(message.into())
    }

    pub fn encode_failed(format: &'static str, message: impl Into<String>) -> Self {
        ServiceError::EncodeFailed {
            format,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_display() {
        let err = ServiceError::FetchFailed {
            status: "404 Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "failed to fetch image: 404 Not Found");
    }

    #[test]
    fn test_encode_failed_display() {
        let err = ServiceError::encode_failed("webp", "encoder error");
        assert_eq!(err.to_string(), "failed to encode to webp: encoder error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServiceError>();
    }
}

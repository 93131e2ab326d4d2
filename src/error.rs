//! Error types for image transformation.

use std::time::Duration;

/// Errors that can occur while uploading, transforming, or saving an image.
#[derive(Debug, thiserror::Error)]
pub enum RetouchError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, sanitized.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, if the response carried one.
        retry_after: Option<Duration>,
    },

    /// API responded, but no part contained inline image data
    /// (e.g. a text-only refusal).
    #[error("no image data in the API response")]
    NoImage,

    /// A data-URL or base64 payload could not be decoded.
    #[error("invalid image payload: {0}")]
    InvalidImage(String),

    /// Download requested with no processed image present.
    #[error("no processed image to download")]
    NoProcessedImage,

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (e.g. saving the processed file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for image transformation operations.
pub type Result<T> = std::result::Result<T, RetouchError>;

const MAX_ERROR_BODY_LEN: usize = 600;

/// Sanitizes an API error body before it is stored or logged.
///
/// Redacts anything that looks like a `key=...` credential and truncates
/// oversized bodies so HTML error pages don't flood the log.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let mut out = String::with_capacity(text.len().min(MAX_ERROR_BODY_LEN));
    let mut rest = text;
    while let Some(pos) = rest.find("key=") {
        let after = pos + "key=".len();
        out.push_str(&rest[..after]);
        out.push_str("REDACTED");
        let tail = &rest[after..];
        let end = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    out.push_str(rest);

    if out.len() > MAX_ERROR_BODY_LEN {
        let mut cut = MAX_ERROR_BODY_LEN;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push_str("...");
    }
    out
}

/// Parses a `Retry-After` header value in seconds, if present.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RetouchError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        assert_eq!(
            RetouchError::NoImage.to_string(),
            "no image data in the API response"
        );
    }

    #[test]
    fn sanitize_redacts_api_keys() {
        let body = "request to /v1beta/models?key=AIzaSyA-12_bcd failed";
        let clean = sanitize_error_message(body);
        assert!(clean.contains("key=REDACTED"));
        assert!(!clean.contains("AIzaSyA"));
        assert!(clean.ends_with("failed"));
    }

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(10_000);
        let clean = sanitize_error_message(&body);
        assert!(clean.len() <= MAX_ERROR_BODY_LEN + 3);
        assert!(clean.ends_with("..."));
    }

    #[test]
    fn sanitize_leaves_clean_text_alone() {
        assert_eq!(
            sanitize_error_message("model overloaded"),
            "model overloaded"
        );
    }
}

//! Error types for the Open Tree of Life API client

use std::fmt;

/// Errors that can occur when interacting with the Open Tree of Life API
#[derive(Debug)]
pub enum OtolError {
    /// Request could not be sent or the connection failed
    Http(reqwest::Error),
    /// Service answered with a non-success status
    Status {
        status: u16,
        message: Option<String>,
    },
    /// Failed to parse JSON response
    Json(serde_json::Error),
}

impl OtolError {
    /// Whether the same request may succeed if repeated later.
    ///
    /// Connection problems, server errors, timeouts and rate limiting are
    /// transient. Any other 4xx status means the request itself is bad (an
    /// unknown id, a malformed query) and is definitive, as is a body that
    /// does not decode.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => !(e.is_decode() || e.is_builder()),
            Self::Status { status, .. } => {
                !(400..500).contains(status) || *status == 408 || *status == 429
            }
            Self::Json(_) => false,
        }
    }
}

impl fmt::Display for OtolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "Open Tree of Life HTTP error: {}", e),
            Self::Status {
                status,
                message: Some(msg),
            } => write!(f, "Open Tree of Life returned status {}: {}", status, msg),
            Self::Status {
                status,
                message: None,
            } => write!(f, "Open Tree of Life returned status {}", status),
            Self::Json(e) => write!(f, "Open Tree of Life JSON parse error: {}", e),
        }
    }
}

impl std::error::Error for OtolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for OtolError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for OtolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for Open Tree of Life API operations
pub type Result<T> = std::result::Result<T, OtolError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> OtolError {
        OtolError::Status {
            status: code,
            message: None,
        }
    }

    #[test]
    fn test_client_errors_are_definitive() {
        assert!(!status(400).is_transient());
        assert!(!status(404).is_transient());
    }

    #[test]
    fn test_server_errors_and_throttling_are_transient() {
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(status(408).is_transient());
    }

    #[test]
    fn test_json_error_is_definitive() {
        let err = serde_json::from_str::<TaxonProbe>("{").unwrap_err();
        assert!(!OtolError::Json(err).is_transient());
    }

    #[test]
    fn test_status_display_with_message() {
        let err = OtolError::Status {
            status: 400,
            message: Some("No taxon with ott_id 0".to_string()),
        };
        assert_eq!(
            format!("{}", err),
            "Open Tree of Life returned status 400: No taxon with ott_id 0"
        );
    }

    #[derive(Debug, serde::Deserialize)]
    struct TaxonProbe {
        #[allow(dead_code)]
        ott_id: u64,
    }
}

//! Error types for the Global Names client

use std::fmt;

/// Errors that can occur when interacting with the Global Names resolver
#[derive(Debug)]
pub enum GnamesError {
    /// Request could not be sent or the connection failed
    Http(reqwest::Error),
    /// Resolver answered with a non-success status
    Status(u16),
    /// Failed to parse JSON response
    Json(serde_json::Error),
}

impl GnamesError {
    /// Whether the same request may succeed if repeated later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => !(e.is_decode() || e.is_builder()),
            Self::Status(status) => !(400..500).contains(status) || *status == 408 || *status == 429,
            Self::Json(_) => false,
        }
    }
}

impl fmt::Display for GnamesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "Global Names HTTP error: {}", e),
            Self::Status(status) => write!(f, "Global Names returned status {}", status),
            Self::Json(e) => write!(f, "Global Names JSON parse error: {}", e),
        }
    }
}

impl std::error::Error for GnamesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for GnamesError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for GnamesError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for Global Names operations
pub type Result<T> = std::result::Result<T, GnamesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(
            format!("{}", GnamesError::Status(502)),
            "Global Names returned status 502"
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(GnamesError::Status(502).is_transient());
        assert!(GnamesError::Status(429).is_transient());
        assert!(!GnamesError::Status(400).is_transient());
    }
}

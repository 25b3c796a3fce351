//! Error types for the name-resolution engine

use std::fmt;

#[derive(Debug)]
pub enum ResolveError {
    /// A service stayed unavailable for the whole bounded retry budget
    RetriesExhausted { service: String, attempts: u32 },
    /// The external name parser failed to run or produced unreadable output
    Parser(String),
    /// Input table is unusable (missing `name` column, bad header)
    Input(String),
    Csv(Box<csv::Error>),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::RetriesExhausted { service, attempts } => {
                write!(f, "{} unavailable after {} attempts", service, attempts)
            }
            ResolveError::Parser(msg) => write!(f, "Name parser error: {}", msg),
            ResolveError::Input(msg) => write!(f, "Input error: {}", msg),
            ResolveError::Csv(err) => write!(f, "CSV error: {}", err),
            ResolveError::Io(err) => write!(f, "IO error: {}", err),
            ResolveError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Csv(err) => Some(err.as_ref()),
            ResolveError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<csv::Error> for ResolveError {
    fn from(err: csv::Error) -> Self {
        ResolveError::Csv(Box::new(err))
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(err: std::io::Error) -> Self {
        ResolveError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ResolveError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ResolveError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_display() {
        let err = ResolveError::RetriesExhausted {
            service: "Open Tree of Life".to_string(),
            attempts: 3,
        };
        assert_eq!(
            format!("{}", err),
            "Open Tree of Life unavailable after 3 attempts"
        );
    }

    #[test]
    fn test_input_error_display() {
        let err = ResolveError::Input("missing 'name' column".to_string());
        assert_eq!(format!("{}", err), "Input error: missing 'name' column");
    }

    #[test]
    fn test_io_error_has_source() {
        let err: ResolveError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(format!("{}", err), "IO error: gone");
    }

    #[test]
    fn test_error_is_debug() {
        let err = ResolveError::Parser("gnparser not found".to_string());
        assert!(format!("{:?}", err).contains("Parser"));
    }
}

//! Core error types for RECON.GRAPH.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid encoding
    InvalidEncoding { reason: String },

    /// Invalid ID format
    InvalidId { reason: String },

    /// Invalid version
    InvalidVersion { reason: String },

    /// Invalid execution context entry
    InvalidContext { key: String, reason: String },

    /// Parse error
    ParseError { message: String },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEncoding { reason } => write!(f, "Invalid encoding: {}", reason),
            Self::InvalidId { reason } => write!(f, "Invalid ID: {}", reason),
            Self::InvalidVersion { reason } => write!(f, "Invalid version: {}", reason),
            Self::InvalidContext { key, reason } => {
                write!(f, "Invalid context entry {}: {}", key, reason)
            }
            Self::ParseError { message } => write!(f, "Parse error: {}", message),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidId {
            reason: "not a uuid".to_string(),
        };
        assert_eq!(format!("{}", err), "Invalid ID: not a uuid");

        let err = CoreError::InvalidContext {
            key: "agent_run_id".to_string(),
            reason: "empty value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid context entry agent_run_id: empty value"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_error_equality() {
        let err1 = CoreError::ParseError {
            message: "x".to_string(),
        };
        let err2 = CoreError::ParseError {
            message: "x".to_string(),
        };
        assert_eq!(err1, err2);
        assert_ne!(
            err1,
            CoreError::InvalidVersion {
                reason: "x".to_string()
            }
        );
    }
}

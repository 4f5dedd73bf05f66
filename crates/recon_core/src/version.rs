//! Semantic versions for tools and the field-reference mini-language.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a new version
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse from `major.minor.patch`
    ///
    /// # Errors
    ///
    /// Returns error if format is invalid
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let mut parts = s.trim().split('.');
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(VersionError::InvalidFormat(s.to_string()));
        };

        let component = |p: &str| {
            p.parse::<u64>()
                .map_err(|_| VersionError::InvalidComponent(p.to_string()))
        };

        Ok(Self::new(component(major)?, component(minor)?, component(patch)?))
    }

    /// Whether a consumer built against `self` can read declarations written
    /// for `other`: same major, and `other` is not newer.
    #[must_use]
    pub fn can_read(&self, other: &Version) -> bool {
        self.major == other.major && other <= self
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// Version-related errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Invalid format
    InvalidFormat(String),
    /// Invalid component
    InvalidComponent(String),
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(s) => write!(f, "Invalid version format: {}", s),
            Self::InvalidComponent(s) => write!(f, "Invalid version component: {}", s),
        }
    }
}

impl std::error::Error for VersionError {}

impl From<VersionError> for CoreError {
    fn from(err: VersionError) -> Self {
        CoreError::InvalidVersion {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
        assert_eq!(format!("{}", v), "1.2.3");
    }

    #[test]
    fn test_version_parse_error() {
        assert!(matches!(
            Version::parse("1.2"),
            Err(VersionError::InvalidFormat(_))
        ));
        assert!(matches!(
            Version::parse("1.2.3.4"),
            Err(VersionError::InvalidFormat(_))
        ));
        assert!(matches!(
            Version::parse("a.b.c"),
            Err(VersionError::InvalidComponent(_))
        ));
    }

    #[test]
    fn test_version_ord() {
        assert!(Version::new(1, 2, 3) < Version::new(1, 2, 4));
        assert!(Version::new(1, 9, 9) < Version::new(2, 0, 0));
    }

    #[test]
    fn test_version_can_read() {
        let reader = Version::new(1, 2, 0);
        assert!(reader.can_read(&Version::new(1, 0, 0)));
        assert!(reader.can_read(&Version::new(1, 2, 0)));
        assert!(!reader.can_read(&Version::new(1, 3, 0)));
        assert!(!reader.can_read(&Version::new(2, 0, 0)));
    }

    #[test]
    fn test_version_serde_as_string() {
        let v: Version = serde_json::from_str("\"1.4.2\"").unwrap();
        assert_eq!(v, Version::new(1, 4, 2));
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"1.4.2\"");
        assert!(serde_json::from_str::<Version>("\"1.x\"").is_err());
    }

    #[test]
    fn test_version_error_into_core() {
        let err: CoreError = VersionError::InvalidFormat("x".to_string()).into();
        assert!(matches!(err, CoreError::InvalidVersion { .. }));
    }
}

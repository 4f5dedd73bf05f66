//! Materializer configuration.

use serde::{Deserialize, Deserializer, Serialize};

/// Default cap on fan-out instances per template or endpoint pair
pub const DEFAULT_MAX_FANOUT: usize = 10_000;

/// Materializer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializeConfig {
    /// Cap on instances produced by one wildcard expansion; never below one
    #[serde(deserialize_with = "at_least_one")]
    pub max_fanout: usize,
    /// Emit at most one edge per (type, from, to)
    pub dedup_edges: bool,
    /// Mark edges whose endpoints were never materialized
    pub flag_dangling: bool,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            max_fanout: DEFAULT_MAX_FANOUT,
            dedup_edges: true,
            flag_dangling: true,
        }
    }
}

fn at_least_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    usize::deserialize(deserializer).map(|n| n.max(1))
}

impl MaterializeConfig {
    /// Set the fan-out cap; zero is raised to one
    #[must_use]
    pub fn with_max_fanout(mut self, max_fanout: usize) -> Self {
        self.max_fanout = max_fanout.max(1);
        self
    }

    /// Enable or disable edge deduplication
    #[must_use]
    pub fn with_dedup_edges(mut self, dedup_edges: bool) -> Self {
        self.dedup_edges = dedup_edges;
        self
    }

    /// Enable or disable dangling-edge flagging
    #[must_use]
    pub fn with_flag_dangling(mut self, flag_dangling: bool) -> Self {
        self.flag_dangling = flag_dangling;
        self
    }

    /// Copy with a zero fan-out cap raised to one
    #[must_use]
    pub fn normalized(self) -> Self {
        let max_fanout = self.max_fanout;
        self.with_max_fanout(max_fanout)
    }

    /// Parse from JSON; absent fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or a field has the wrong type
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MaterializeConfig::default();
        assert_eq!(config.max_fanout, 10_000);
        assert!(config.dedup_edges);
        assert!(config.flag_dangling);
    }

    #[test]
    fn test_from_partial_json() {
        let config = MaterializeConfig::from_json(r#"{"dedup_edges": false}"#).unwrap();
        assert!(!config.dedup_edges);
        assert_eq!(config.max_fanout, DEFAULT_MAX_FANOUT);

        let config = MaterializeConfig::from_json(r#"{"max_fanout": 0}"#).unwrap();
        assert_eq!(config.max_fanout, 1);

        assert!(MaterializeConfig::from_json(r#"{"max_fanout": "lots"}"#).is_err());
    }

    #[test]
    fn test_zero_fanout_raised() {
        let config: MaterializeConfig = serde_json::from_str(r#"{"max_fanout": 0}"#).unwrap();
        assert_eq!(config.max_fanout, 1);

        let literal = MaterializeConfig {
            max_fanout: 0,
            ..MaterializeConfig::default()
        };
        assert_eq!(literal.normalized().max_fanout, 1);
    }
}

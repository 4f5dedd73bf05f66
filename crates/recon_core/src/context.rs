//! Out-of-band execution context addressed by `{_context.*}` references.
//!
//! The invoking framework supplies these values (at minimum the agent run
//! that triggered a tool execution). They are never part of a tool's output.

use crate::error::{CoreError, CoreResult};
use crate::id::AgentRunId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known key for the agent run that invoked the tool
pub const AGENT_RUN_ID: &str = "agent_run_id";

/// Flat mapping of context values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    values: Map<String, Value>,
}

impl ExecutionContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self { values: Map::new() }
    }

    /// Create a context carrying an agent run ID
    #[must_use]
    pub fn for_run(run: &AgentRunId) -> Self {
        Self::new().with_agent_run_id(run.to_string())
    }

    /// Set the agent run ID
    #[must_use]
    pub fn with_agent_run_id(mut self, id: impl Into<String>) -> Self {
        self.values
            .insert(AGENT_RUN_ID.to_string(), Value::String(id.into()));
        self
    }

    /// Insert a value
    ///
    /// # Errors
    ///
    /// Returns error if the key is empty or contains path syntax
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> CoreResult<()> {
        let key = key.into();
        validate_key(&key)?;
        self.values.insert(key, value);
        Ok(())
    }

    /// Parse a `key=value` assignment.
    ///
    /// The value is read as JSON when it parses as JSON, otherwise it is
    /// kept as a plain string.
    ///
    /// # Errors
    ///
    /// Returns error if there is no `=` or the key is invalid
    pub fn parse_assignment(assignment: &str) -> CoreResult<(String, Value)> {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| CoreError::ParseError {
                message: format!("expected key=value, got '{}'", assignment),
            })?;
        let key = key.trim();
        validate_key(key)?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok((key.to_string(), value))
    }

    /// Get a value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get the agent run ID if present
    #[must_use]
    pub fn agent_run_id(&self) -> Option<&str> {
        self.values.get(AGENT_RUN_ID).and_then(Value::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the context is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The context as a JSON object, the root of `{_context.*}` paths
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

fn validate_key(key: &str) -> CoreResult<()> {
    if key.is_empty() {
        return Err(CoreError::InvalidContext {
            key: key.to_string(),
            reason: "empty key".to_string(),
        });
    }
    if key.contains(['.', '[', ']', '{', '}']) {
        return Err(CoreError::InvalidContext {
            key: key.to_string(),
            reason: "key must not contain path syntax".to_string(),
        });
    }
    Ok(())
}

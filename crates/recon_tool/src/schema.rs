//! Tool descriptors: identity plus input and output schemas.

use recon_core::Version;
use recon_schema::{SchemaValue, DSL_VERSION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Descriptor for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,
    /// Tool version
    pub version: String,
    /// Human readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Free-form classification tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Input document schema
    pub input: SchemaValue,
    /// Output document schema, carrying the taxonomy mappings
    pub output: SchemaValue,
    /// Field-reference syntax version the mappings are written against
    #[serde(default = "current_dsl_version")]
    pub dsl_version: Version,
}

fn current_dsl_version() -> Version {
    DSL_VERSION
}

impl ToolSchema {
    /// Create a new tool schema
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        input: SchemaValue,
        output: SchemaValue,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
            tags: Vec::new(),
            input,
            output,
            dsl_version: DSL_VERSION,
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare the field-reference syntax version
    #[must_use]
    pub fn with_dsl_version(mut self, version: Version) -> Self {
        self.dsl_version = version;
        self
    }

    /// Add a tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add several tags
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Check for a tag
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Render input and output as JSON Schema documents
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json_schemas(&self) -> Result<Value, serde_json::Error> {
        Ok(serde_json::json!({
            "name": self.name,
            "version": self.version,
            "description": self.description,
            "tags": self.tags,
            "dsl_version": self.dsl_version,
            "input_schema": self.input.to_json_schema()?,
            "output_schema": self.output.to_json_schema()?,
        }))
    }
}

//! Schema declaration errors.
//!
//! These are raised while compiling a tool's schema, before the tool can
//! run. Every variant carries the schema path of the offending value.

use crate::template::TemplateError;

/// Malformed schema or taxonomy declaration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Array kind without `items`
    #[error("{path}: array schema has no items")]
    MissingItems { path: String },
    /// Object kind without `properties`
    #[error("{path}: object schema has no properties")]
    MissingProperties { path: String },
    /// `items` on a non-array kind
    #[error("{path}: items are only valid on array schemas")]
    UnexpectedItems { path: String },
    /// `properties` or `required` on a non-object kind
    #[error("{path}: properties are only valid on object schemas")]
    UnexpectedProperties { path: String },
    /// `required` names an undeclared member
    #[error("{path}: required property '{name}' is not declared")]
    UnknownRequired { path: String, name: String },
    /// `minimum > maximum`
    #[error("{path}: minimum {minimum} exceeds maximum {maximum}")]
    InvalidRange {
        path: String,
        minimum: f64,
        maximum: f64,
    },
    /// Node type does not match `[a-z][a-z0-9_]*`
    #[error("{path}: invalid node type '{name}'")]
    InvalidNodeType { path: String, name: String },
    /// Relationship type does not match `[A-Z][A-Z0-9_]*`
    #[error("{path}: invalid relationship type '{name}'")]
    InvalidRelationshipType { path: String, name: String },
    /// Property or identifying field name is not an identifier
    #[error("{path}: invalid property name '{name}'")]
    InvalidPropertyName { path: String, name: String },
    /// Transform name is not known
    #[error("{path}: unknown transform '{name}'")]
    UnknownTransform { path: String, name: String },
    /// Identity with no identifying fields
    #[error("{path}: identity has no identifying fields")]
    EmptyIdentity { path: String },
    /// Template endpoint without a `type:` prefix
    #[error("{path}: cannot infer node type from endpoint template '{template}'")]
    UntypedEndpoint { path: String, template: String },
    /// Reference or template does not parse
    #[error("{path}: invalid reference '{expr}': {source}")]
    InvalidReference {
        path: String,
        expr: String,
        #[source]
        source: TemplateError,
    },
}

impl SchemaError {
    /// Schema path of the offending value
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::MissingItems { path }
            | Self::MissingProperties { path }
            | Self::UnexpectedItems { path }
            | Self::UnexpectedProperties { path }
            | Self::UnknownRequired { path, .. }
            | Self::InvalidRange { path, .. }
            | Self::InvalidNodeType { path, .. }
            | Self::InvalidRelationshipType { path, .. }
            | Self::InvalidPropertyName { path, .. }
            | Self::UnknownTransform { path, .. }
            | Self::EmptyIdentity { path }
            | Self::UntypedEndpoint { path, .. }
            | Self::InvalidReference { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::MissingItems {
            path: "$.results".to_string(),
        };
        assert_eq!(err.to_string(), "$.results: array schema has no items");
        assert_eq!(err.path(), "$.results");
    }

    #[test]
    fn test_invalid_reference_display() {
        let err = SchemaError::InvalidReference {
            path: "$".to_string(),
            expr: "{.a".to_string(),
            source: TemplateError::UnclosedBrace { offset: 0 },
        };
        assert_eq!(
            err.to_string(),
            "$: invalid reference '{.a': unclosed '{' at offset 0"
        );
    }
}

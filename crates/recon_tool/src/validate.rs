//! Tool descriptor validation, run before a tool is registered.

use crate::schema::ToolSchema;
use crate::trait_::Tool;
use recon_core::Version;
use recon_schema::{SchemaKind, DSL_VERSION};

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid tool name
    InvalidName { name: String },
    /// Tool and descriptor disagree on name or version
    DescriptorMismatch {
        field: String,
        tool: String,
        schema: String,
    },
    /// Version is not `major.minor.patch`
    InvalidVersion { version: String },
    /// Input or output schema has the wrong shape
    SchemaError { field: String, reason: String },
    /// Mappings target a field-reference syntax this build cannot read
    UnsupportedDsl { declared: String, supported: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName { name } => write!(f, "Invalid tool name: {}", name),
            Self::DescriptorMismatch {
                field,
                tool,
                schema,
            } => write!(
                f,
                "Descriptor {} mismatch: tool reports {}, schema declares {}",
                field, tool, schema
            ),
            Self::InvalidVersion { version } => write!(f, "Invalid tool version: {}", version),
            Self::SchemaError { field, reason } => {
                write!(f, "Schema error in {}: {}", field, reason)
            }
            Self::UnsupportedDsl {
                declared,
                supported,
            } => write!(
                f,
                "Unsupported DSL version {} (this build reads up to {})",
                declared, supported
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// Tool name must be lowercase alphanumeric with single underscores
    NameConvention,
    /// Tool and descriptor must agree on name and version
    DescriptorMatch,
    /// Version must be semver
    VersionFormat,
    /// Input and output schemas must be objects
    SchemaShape,
    /// Declared DSL version must be readable by this build
    DslVersion,
}

/// Tool validator for descriptor checks
#[derive(Debug, Clone)]
pub struct ToolValidator {
    rules: Vec<ValidationRule>,
}

impl ToolValidator {
    /// Create a new validator with every rule enabled
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: vec![
                ValidationRule::NameConvention,
                ValidationRule::DescriptorMatch,
                ValidationRule::VersionFormat,
                ValidationRule::SchemaShape,
                ValidationRule::DslVersion,
            ],
        }
    }

    /// Create a validator with only specific rules
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<ValidationRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Validate a tool against its descriptor
    ///
    /// # Errors
    ///
    /// Returns the first rule violation
    pub fn validate(&self, tool: &dyn Tool, schema: &ToolSchema) -> Result<(), ValidationError> {
        for rule in &self.rules {
            match rule {
                ValidationRule::NameConvention => validate_name(&schema.name)?,
                ValidationRule::DescriptorMatch => validate_match(tool, schema)?,
                ValidationRule::VersionFormat => validate_version(&schema.version)?,
                ValidationRule::SchemaShape => validate_shape(schema)?,
                ValidationRule::DslVersion => validate_dsl(schema)?,
            }
        }
        Ok(())
    }
}

impl Default for ToolValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidName {
        name: name.to_string(),
    };

    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(invalid());
    }
    if name.starts_with('_') || name.ends_with('_') || name.contains("__") {
        return Err(invalid());
    }
    Ok(())
}

fn validate_match(tool: &dyn Tool, schema: &ToolSchema) -> Result<(), ValidationError> {
    for (field, reported, declared) in [
        ("name", tool.name(), schema.name.as_str()),
        ("version", tool.version(), schema.version.as_str()),
    ] {
        if reported != declared {
            return Err(ValidationError::DescriptorMismatch {
                field: field.to_string(),
                tool: reported.to_string(),
                schema: declared.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_version(version: &str) -> Result<(), ValidationError> {
    Version::parse(version)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidVersion {
            version: version.to_string(),
        })
}

fn validate_shape(schema: &ToolSchema) -> Result<(), ValidationError> {
    for (field, value) in [("input", &schema.input), ("output", &schema.output)] {
        if value.kind != SchemaKind::Object {
            return Err(ValidationError::SchemaError {
                field: field.to_string(),
                reason: format!("expected an object schema, found {}", value.kind),
            });
        }
    }
    Ok(())
}

fn validate_dsl(schema: &ToolSchema) -> Result<(), ValidationError> {
    if DSL_VERSION.can_read(&schema.dsl_version) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedDsl {
            declared: schema.dsl_version.to_string(),
            supported: DSL_VERSION.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::builtin::ReplayTool;
    use recon_schema::SchemaValue;
    use serde_json::json;

    fn descriptor(name: &str, version: &str) -> ToolSchema {
        ToolSchema::new(
            name,
            version,
            SchemaValue::object([("target", SchemaValue::string())]),
            SchemaValue::object([("results", SchemaValue::array(SchemaValue::string()))]),
        )
    }

    #[test]
    fn test_validate_name_valid() {
        assert!(validate_name("valid_name").is_ok());
        assert!(validate_name("lowercase123").is_ok());
    }

    #[test]
    fn test_validate_name_invalid() {
        assert!(validate_name("").is_err());
        assert!(validate_name("InvalidName").is_err());
        assert!(validate_name("_invalid").is_err());
        assert!(validate_name("invalid_").is_err());
        assert!(validate_name("double__underscore").is_err());
        assert!(validate_name("dash-name").is_err());
    }

    #[test]
    fn test_validate_tool() {
        let validator = ToolValidator::new();
        let tool = ReplayTool::new("httpx", "1.0.0", json!({}));
        assert!(validator.validate(&tool, &descriptor("httpx", "1.0.0")).is_ok());
    }

    #[test]
    fn test_descriptor_mismatch() {
        let validator = ToolValidator::new();
        let tool = ReplayTool::new("httpx", "1.0.0", json!({}));
        assert_eq!(
            validator.validate(&tool, &descriptor("httpx", "1.1.0")),
            Err(ValidationError::DescriptorMismatch {
                field: "version".to_string(),
                tool: "1.0.0".to_string(),
                schema: "1.1.0".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_version() {
        let validator = ToolValidator::new().with_rules(vec![ValidationRule::VersionFormat]);
        let tool = ReplayTool::new("httpx", "v1", json!({}));
        assert!(matches!(
            validator.validate(&tool, &descriptor("httpx", "v1")),
            Err(ValidationError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_schema_shape() {
        let validator = ToolValidator::new();
        let tool = ReplayTool::new("httpx", "1.0.0", json!({}));
        let mut schema = descriptor("httpx", "1.0.0");
        schema.input = SchemaValue::string();
        let err = validator.validate(&tool, &schema).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema error in input: expected an object schema, found string"
        );
    }

    #[test]
    fn test_dsl_version() {
        let validator = ToolValidator::new().with_rules(vec![ValidationRule::DslVersion]);
        let tool = ReplayTool::new("httpx", "1.0.0", json!({}));
        assert!(validator.validate(&tool, &descriptor("httpx", "1.0.0")).is_ok());

        let newer = descriptor("httpx", "1.0.0").with_dsl_version(Version::new(2, 0, 0));
        assert_eq!(
            validator.validate(&tool, &newer),
            Err(ValidationError::UnsupportedDsl {
                declared: "2.0.0".to_string(),
                supported: DSL_VERSION.to_string(),
            })
        );
        let newer_minor = descriptor("httpx", "1.0.0")
            .with_dsl_version(Version::new(DSL_VERSION.major, DSL_VERSION.minor + 1, 0));
        assert!(validator.validate(&tool, &newer_minor).is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_snake_case_names_accepted(name in "[a-z][a-z0-9]{0,8}(_[a-z0-9]{1,8}){0,2}") {
            proptest::prop_assert!(validate_name(&name).is_ok());
        }

        #[test]
        fn prop_uppercase_names_rejected(prefix in "[a-z]{0,4}", upper in "[A-Z]", suffix in "[a-z]{0,4}") {
            let name = format!("{prefix}{upper}{suffix}");
            proptest::prop_assert!(validate_name(&name).is_err());
        }
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidName {
            name: "BadName".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid tool name: BadName");
    }
}

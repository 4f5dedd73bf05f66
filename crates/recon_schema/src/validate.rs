//! Document validation against schema values.

use crate::value::{json_type_name, SchemaKind, SchemaValue};
use serde_json::Value;

/// Validation error
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value has the wrong JSON type
    TypeMismatch {
        path: String,
        expected: SchemaKind,
        found: &'static str,
    },
    /// Required member absent or null
    MissingRequired { path: String, name: String },
    /// Value outside the declared enum
    NotInEnum { path: String, value: Value },
    /// Number below the declared minimum
    BelowMinimum { path: String, minimum: f64, value: f64 },
    /// Number above the declared maximum
    AboveMaximum { path: String, maximum: f64, value: f64 },
    /// Member not declared by the schema
    UnknownProperty { path: String, name: String },
}

impl ValidationError {
    /// Document path of the offending value
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::MissingRequired { path, .. }
            | Self::NotInEnum { path, .. }
            | Self::BelowMinimum { path, .. }
            | Self::AboveMaximum { path, .. }
            | Self::UnknownProperty { path, .. } => path,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch {
                path,
                expected,
                found,
            } => write!(f, "{}: expected {}, found {}", path, expected, found),
            Self::MissingRequired { path, name } => {
                write!(f, "{}: missing required property '{}'", path, name)
            }
            Self::NotInEnum { path, value } => write!(f, "{}: {} is not an allowed value", path, value),
            Self::BelowMinimum {
                path,
                minimum,
                value,
            } => write!(f, "{}: {} is below minimum {}", path, value, minimum),
            Self::AboveMaximum {
                path,
                maximum,
                value,
            } => write!(f, "{}: {} is above maximum {}", path, value, maximum),
            Self::UnknownProperty { path, name } => {
                write!(f, "{}: unknown property '{}'", path, name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validator for JSON documents
#[derive(Debug, Clone)]
pub struct Validator {
    /// Accept object members the schema does not declare
    pub allow_unknown: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a validator that tolerates undeclared members
    #[must_use]
    pub fn new() -> Self {
        Self { allow_unknown: true }
    }

    /// Reject undeclared object members
    #[must_use]
    pub fn strict() -> Self {
        Self {
            allow_unknown: false,
        }
    }

    /// Validate a document, collecting every violation
    ///
    /// # Errors
    ///
    /// Returns all violations found, in document order
    pub fn validate(&self, schema: &SchemaValue, document: &Value) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        self.check(schema, document, "$", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check(&self, schema: &SchemaValue, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
        if !schema.kind.matches(value) {
            errors.push(ValidationError::TypeMismatch {
                path: path.to_string(),
                expected: schema.kind,
                found: json_type_name(value),
            });
            return;
        }

        if let Some(allowed) = &schema.enum_values {
            if !allowed.contains(value) {
                errors.push(ValidationError::NotInEnum {
                    path: path.to_string(),
                    value: value.clone(),
                });
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(minimum) = schema.minimum.filter(|m| n < *m) {
                errors.push(ValidationError::BelowMinimum {
                    path: path.to_string(),
                    minimum,
                    value: n,
                });
            }
            if let Some(maximum) = schema.maximum.filter(|m| n > *m) {
                errors.push(ValidationError::AboveMaximum {
                    path: path.to_string(),
                    maximum,
                    value: n,
                });
            }
        }

        match value {
            Value::Array(items) => {
                if let Some(item_schema) = &schema.items {
                    for (i, item) in items.iter().enumerate() {
                        self.check(item_schema, item, &format!("{}[{}]", path, i), errors);
                    }
                }
            }
            Value::Object(members) => {
                for name in &schema.required {
                    if members.get(name).is_none_or(Value::is_null) {
                        errors.push(ValidationError::MissingRequired {
                            path: path.to_string(),
                            name: name.clone(),
                        });
                    }
                }
                for (name, member) in members {
                    match schema.property(name) {
                        Some(_) if member.is_null() => {}
                        Some(member_schema) => {
                            self.check(member_schema, member, &format!("{}.{}", path, name), errors);
                        }
                        None if !self.allow_unknown => {
                            errors.push(ValidationError::UnknownProperty {
                                path: path.to_string(),
                                name: name.clone(),
                            });
                        }
                        None => {}
                    }
                }
            }
            _ => {}
        }
    }
}

/// Validate with the tolerant [`Validator`]
///
/// # Errors
///
/// Returns all violations found, in document order
pub fn validate_document(schema: &SchemaValue, document: &Value) -> Result<(), Vec<ValidationError>> {
    Validator::new().validate(schema, document)
}

/// Fill absent members that declare a default, recursively
pub fn apply_defaults(schema: &SchemaValue, document: &mut Value) {
    match document {
        Value::Object(members) if schema.kind == SchemaKind::Object => {
            let Some(declared) = &schema.properties else {
                return;
            };
            for (name, member_schema) in declared {
                match members.get_mut(name) {
                    Some(member) if !member.is_null() => apply_defaults(member_schema, member),
                    _ => {
                        if let Some(default) = &member_schema.default {
                            members.insert(name.clone(), default.clone());
                        }
                    }
                }
            }
        }
        Value::Array(items) if schema.kind == SchemaKind::Array => {
            if let Some(item_schema) = &schema.items {
                for item in items {
                    apply_defaults(item_schema, item);
                }
            }
        }
        _ => {}
    }
}

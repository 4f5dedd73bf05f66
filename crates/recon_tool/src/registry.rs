//! Tool registry.
//!
//! Registration validates the descriptor and compiles the output schema, so
//! a tool with a malformed taxonomy declaration never becomes runnable.

use crate::schema::ToolSchema;
use crate::trait_::Tool;
use crate::validate::{ToolValidator, ValidationError};
use indexmap::IndexMap;
use recon_schema::{compile, CompiledSchema, CompilerWarning, SchemaError};
use std::sync::Arc;

/// Error from registry operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Tool already registered
    #[error("tool already registered: {name}")]
    AlreadyRegistered { name: String },
    /// Tool not found
    #[error("tool not found: {name}")]
    NotFound { name: String },
    /// Same name registered with another version
    #[error("version conflict for {name}: existing {existing}, new {new}")]
    VersionConflict {
        name: String,
        existing: String,
        new: String,
    },
    /// Descriptor failed validation
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Output schema declaration is malformed
    #[error("output schema of {name} is malformed: {source}")]
    Schema {
        name: String,
        #[source]
        source: SchemaError,
    },
}

/// Entry for a registered tool
#[derive(Clone)]
pub struct ToolEntry {
    /// The tool itself
    pub tool: Arc<dyn Tool>,
    /// Tool descriptor
    pub schema: ToolSchema,
    /// Compiled output schema
    pub compiled: Arc<CompiledSchema>,
    /// Warnings from compiling the output schema
    pub warnings: Vec<CompilerWarning>,
}

impl ToolEntry {
    /// Tool name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Tool version
    #[must_use]
    pub fn version(&self) -> &str {
        &self.schema.version
    }
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEntry")
            .field("name", &self.schema.name)
            .field("version", &self.schema.version)
            .field("warnings", &self.warnings.len())
            .finish()
    }
}

/// Registry for tools, in registration order
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, ToolEntry>,
    validator: ToolValidator,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom descriptor validator
    #[must_use]
    pub fn with_validator(mut self, validator: ToolValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Register a tool
    ///
    /// # Errors
    ///
    /// Returns error if the tool is already registered, its descriptor is
    /// invalid, or its output schema does not compile
    pub fn register(&mut self, tool: Arc<dyn Tool>, schema: ToolSchema) -> Result<(), RegistryError> {
        let name = schema.name.clone();

        if let Some(existing) = self.tools.get(&name) {
            if existing.schema.version != schema.version {
                return Err(RegistryError::VersionConflict {
                    name,
                    existing: existing.schema.version.clone(),
                    new: schema.version,
                });
            }
            return Err(RegistryError::AlreadyRegistered { name });
        }

        self.validator.validate(tool.as_ref(), &schema)?;
        let output = compile(&schema.output).map_err(|source| RegistryError::Schema {
            name: name.clone(),
            source,
        })?;
        for warning in &output.warnings {
            tracing::warn!(tool = %name, %warning, "taxonomy declaration warning");
        }
        tracing::debug!(
            tool = %name,
            version = %schema.version,
            mappings = output.schema.mapping_count(),
            "registered tool"
        );

        self.tools.insert(
            name,
            ToolEntry {
                tool,
                schema,
                compiled: Arc::new(output.schema),
                warnings: output.warnings,
            },
        );
        Ok(())
    }

    /// Get a tool by name
    ///
    /// # Errors
    ///
    /// Returns error if tool not found
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>, RegistryError> {
        self.get_entry(name).map(|e| Arc::clone(&e.tool))
    }

    /// Get tool entry by name
    ///
    /// # Errors
    ///
    /// Returns error if tool not found
    pub fn get_entry(&self, name: &str) -> Result<&ToolEntry, RegistryError> {
        self.tools
            .get(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// List all registered tool names
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// List tools carrying a tag
    #[must_use]
    pub fn list_by_tag(&self, tag: &str) -> Vec<String> {
        self.tools
            .iter()
            .filter(|(_, e)| e.schema.has_tag(tag))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Check if a tool is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Unregister a tool
    ///
    /// # Errors
    ///
    /// Returns error if tool not found
    pub fn unregister(&mut self, name: &str) -> Result<(), RegistryError> {
        self.tools
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Get the count of registered tools
    #[must_use]
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

//! Running registered tools end to end.
//!
//! A run fills input defaults, validates the input, executes the tool, and
//! materializes the output through the tool's compiled taxonomy.

use crate::registry::{RegistryError, ToolEntry, ToolRegistry};
use crate::trait_::{Tool, ToolError};
use recon_core::ExecutionContext;
use recon_schema::{
    apply_defaults, validate_document, CompiledSchema, SchemaValue, ValidationError, Validator,
};
use recon_taxonomy::{MaterializeConfig, MaterializedGraph, Materializer};
use serde_json::Value;
use std::sync::Arc;

/// Error from adapter operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdapterError {
    /// Input document does not satisfy the tool's input schema
    #[error("invalid input for {tool}: {}", join(.violations))]
    InvalidInput {
        tool: String,
        violations: Vec<ValidationError>,
    },
    /// Tool execution failed
    #[error(transparent)]
    Tool(#[from] ToolError),
    /// Tool lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

fn join(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result of one tool run
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRun {
    /// Input after defaults were applied
    pub input: Value,
    /// Raw output document
    pub output: Value,
    /// Graph materialized from the output
    pub graph: MaterializedGraph,
}

/// Runs a single registered tool
pub struct ToolAdapter {
    name: String,
    tool: Arc<dyn Tool>,
    input_schema: SchemaValue,
    output_schema: SchemaValue,
    compiled: Arc<CompiledSchema>,
    materializer: Materializer,
}

impl ToolAdapter {
    /// Create an adapter for a registry entry
    #[must_use]
    pub fn new(entry: &ToolEntry) -> Self {
        Self {
            name: entry.schema.name.clone(),
            tool: Arc::clone(&entry.tool),
            input_schema: entry.schema.input.clone(),
            output_schema: entry.schema.output.clone(),
            compiled: Arc::clone(&entry.compiled),
            materializer: Materializer::default(),
        }
    }

    /// Set the materialization config
    #[must_use]
    pub fn with_config(mut self, config: MaterializeConfig) -> Self {
        self.materializer = Materializer::new(config);
        self
    }

    /// Tool name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate input, execute the tool, and materialize its output
    ///
    /// # Errors
    ///
    /// Returns error if the input is invalid or the tool fails
    pub fn run(&self, input: &Value, context: &ExecutionContext) -> Result<ToolRun, AdapterError> {
        let span = tracing::info_span!("tool_run", tool = %self.name);
        let _entered = span.enter();

        let mut input = input.clone();
        apply_defaults(&self.input_schema, &mut input);
        validate_document(&self.input_schema, &input).map_err(|violations| {
            AdapterError::InvalidInput {
                tool: self.name.clone(),
                violations,
            }
        })?;

        let output = self.tool.execute(&input)?;
        let graph = self.map_output(&output, context);
        tracing::info!(
            nodes = graph.stats.nodes,
            edges = graph.stats.edges,
            "tool run complete"
        );
        Ok(ToolRun {
            input,
            output,
            graph,
        })
    }

    /// Materialize an output document without running the tool.
    ///
    /// Output that strays from the declared schema is still mapped; the
    /// mismatches are logged and the materializer skips what it cannot use.
    #[must_use]
    pub fn map_output(&self, output: &Value, context: &ExecutionContext) -> MaterializedGraph {
        if let Err(violations) = Validator::new().validate(&self.output_schema, output) {
            if let Some(first) = violations.first() {
                tracing::warn!(
                    tool = %self.name,
                    violations = violations.len(),
                    %first,
                    "output does not match declared schema"
                );
            }
        }
        self.materializer.materialize(output, &self.compiled, context)
    }
}

/// Runs tools by name from a shared registry
#[derive(Debug, Clone)]
pub struct ToolHost {
    registry: Arc<ToolRegistry>,
    config: MaterializeConfig,
}

impl ToolHost {
    /// Create a host over a registry
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            config: MaterializeConfig::default(),
        }
    }

    /// Set the materialization config
    #[must_use]
    pub fn with_config(mut self, config: MaterializeConfig) -> Self {
        self.config = config;
        self
    }

    /// The underlying registry
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Adapter for a named tool
    ///
    /// # Errors
    ///
    /// Returns error if tool not found
    pub fn adapter(&self, name: &str) -> Result<ToolAdapter, AdapterError> {
        let entry = self.registry.get_entry(name)?;
        Ok(ToolAdapter::new(entry).with_config(self.config.clone()))
    }

    /// Run a tool by name
    ///
    /// # Errors
    ///
    /// Returns error if tool not found, input is invalid, or execution fails
    pub fn run(
        &self,
        name: &str,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<ToolRun, AdapterError> {
        self.adapter(name)?.run(input, context)
    }

    /// Materialize a captured output document for a named tool
    ///
    /// # Errors
    ///
    /// Returns error if tool not found
    pub fn map_output(
        &self,
        name: &str,
        output: &Value,
        context: &ExecutionContext,
    ) -> Result<MaterializedGraph, AdapterError> {
        Ok(self.adapter(name)?.map_output(output, context))
    }

    /// List available tools
    #[must_use]
    pub fn list_tools(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Check if tool is available
    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }
}

/// Built-in tools
pub mod builtin {
    use super::{Tool, ToolError};
    use serde_json::Value;

    /// Tool that replays a previously captured output document.
    ///
    /// Stands in for a scanner binary when its output was recorded
    /// elsewhere, so the captured run can be validated and mapped.
    #[derive(Debug, Clone)]
    pub struct ReplayTool {
        name: String,
        version: String,
        output: Value,
    }

    impl ReplayTool {
        /// Create a replay tool
        #[must_use]
        pub fn new(name: impl Into<String>, version: impl Into<String>, output: Value) -> Self {
            Self {
                name: name.into(),
                version: version.into(),
                output,
            }
        }

        /// The captured output
        #[must_use]
        pub fn output(&self) -> &Value {
            &self.output
        }
    }

    impl Tool for ReplayTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            &self.version
        }

        fn execute(&self, _input: &Value) -> Result<Value, ToolError> {
            Ok(self.output.clone())
        }
    }
}

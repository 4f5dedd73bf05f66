//! RECON.GRAPH CLI
//!
//! Inspect the bundled tool descriptors, check taxonomy declarations,
//! validate input documents, and materialize captured tool output into
//! graph JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use recon_core::{AgentRunId, ExecutionContext};
use recon_schema::{apply_defaults, compile, validate_document};
use recon_taxonomy::{MaterializeConfig, MaterializedGraph};
use recon_tool::catalog;
use recon_tool::{
    ReplayTool, ToolHost, ToolRegistry, ToolSchema, ToolValidator, ValidationRule,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "RECON_LOG";

#[derive(Parser, Debug)]
#[command(name = "recon")]
#[command(about = "RECON.GRAPH - tool schemas and taxonomy materialization", long_about = None)]
struct Cli {
    /// Materializer config file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Agent run ID exposed as `_context.agent_run_id`; random when omitted
    #[arg(long, global = true)]
    agent_run_id: Option<String>,
    /// Extra execution context entry
    #[arg(long = "context", global = true, value_name = "KEY=VALUE")]
    context: Vec<String>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List bundled tools
    Tools {
        /// Only tools carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Print a tool's input and output JSON Schemas
    Schema {
        /// Bundled tool name or descriptor file
        tool: String,
    },
    /// Compile a tool's taxonomy declarations and report warnings
    Check {
        /// Bundled tool name or descriptor file
        tool: String,
    },
    /// Validate an input document against a tool's input schema
    Validate {
        /// Bundled tool name or descriptor file
        #[arg(short, long)]
        tool: String,
        /// Input document
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Materialize a captured output document into graph JSON
    Map {
        /// Bundled tool name or descriptor file
        #[arg(short, long)]
        tool: String,
        /// Captured output document
        #[arg(short, long)]
        output: PathBuf,
        /// Input document the output was produced from, validated first
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Pretty-print the graph
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let rendered = execute(&cli)?;
    println!("{}", rendered);
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn execute(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Tools { tag } => Ok(list_tools(tag.as_deref())),
        Commands::Schema { tool } => {
            let descriptor = resolve_descriptor(tool)?;
            let schemas = descriptor.to_json_schemas()?;
            Ok(serde_json::to_string_pretty(&schemas)?)
        }
        Commands::Check { tool } => check(&resolve_descriptor(tool)?),
        Commands::Validate { tool, input } => {
            let descriptor = resolve_descriptor(tool)?;
            validate_input(&descriptor, &read_json(input)?)
        }
        Commands::Map {
            tool,
            output,
            input,
            pretty,
        } => {
            let descriptor = resolve_descriptor(tool)?;
            let config = load_config(cli.config.as_deref())?;
            let context = execution_context(cli.agent_run_id.as_deref(), &cli.context)?;
            let input = input.as_deref().map(read_json).transpose()?;
            let graph = map(descriptor, read_json(output)?, input, config, &context)?;
            let digest = graph.digest()?;
            tracing::info!(
                nodes = graph.stats.nodes,
                edges = graph.stats.edges,
                %digest,
                "materialized"
            );
            if *pretty {
                Ok(serde_json::to_string_pretty(&graph)?)
            } else {
                Ok(serde_json::to_string(&graph)?)
            }
        }
    }
}

fn list_tools(tag: Option<&str>) -> String {
    catalog::all()
        .into_iter()
        .filter(|schema| tag.is_none_or(|t| schema.has_tag(t)))
        .map(|schema| {
            format!(
                "{:<12} {:<7} dsl {:<6} {}",
                schema.name,
                schema.version,
                schema.dsl_version.to_string(),
                schema.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A bundled tool name, or otherwise a path to a descriptor JSON file
fn resolve_descriptor(tool: &str) -> Result<ToolSchema> {
    if let Some(schema) = catalog::get(tool) {
        return Ok(schema);
    }
    let path = Path::new(tool);
    if !path.is_file() {
        return Err(eyre!(
            "unknown tool '{}' (bundled: {})",
            tool,
            catalog::TOOL_NAMES.join(", ")
        ));
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read descriptor {}", path.display()))?;
    serde_json::from_str(&text)
        .wrap_err_with(|| format!("failed to parse descriptor {}", path.display()))
}

fn check(descriptor: &ToolSchema) -> Result<String> {
    let probe = ReplayTool::new(&descriptor.name, &descriptor.version, Value::Null);
    ToolValidator::new()
        .with_rules(vec![
            ValidationRule::NameConvention,
            ValidationRule::VersionFormat,
            ValidationRule::SchemaShape,
            ValidationRule::DslVersion,
        ])
        .validate(&probe, descriptor)?;
    compile(&descriptor.input).wrap_err("input schema is malformed")?;
    let output = compile(&descriptor.output).wrap_err("output schema is malformed")?;

    let mut lines = vec![format!(
        "{} {} (dsl {}): {} mappings, {} warnings",
        descriptor.name,
        descriptor.version,
        descriptor.dsl_version,
        output.schema.mapping_count(),
        output.warnings.len()
    )];
    lines.push(format!(
        "node types: {}",
        output.schema.node_types().join(", ")
    ));
    lines.extend(output.warnings.iter().map(|w| format!("warning: {}", w)));
    Ok(lines.join("\n"))
}

fn validate_input(descriptor: &ToolSchema, input: &Value) -> Result<String> {
    let mut input = input.clone();
    apply_defaults(&descriptor.input, &mut input);
    if let Err(violations) = validate_document(&descriptor.input, &input) {
        let details: Vec<String> = violations.iter().map(ToString::to_string).collect();
        return Err(eyre!(
            "{} violation(s) against {} input schema:\n{}",
            violations.len(),
            descriptor.name,
            details.join("\n")
        ));
    }
    Ok(serde_json::to_string_pretty(&input)?)
}

fn map(
    descriptor: ToolSchema,
    output: Value,
    input: Option<Value>,
    config: MaterializeConfig,
    context: &ExecutionContext,
) -> Result<MaterializedGraph> {
    let name = descriptor.name.clone();
    let tool = ReplayTool::new(&descriptor.name, &descriptor.version, output.clone());

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(tool), descriptor)?;
    let host = ToolHost::new(Arc::new(registry)).with_config(config);

    match input {
        Some(input) => Ok(host.run(&name, &input, context)?.graph),
        None => Ok(host.map_output(&name, &output, context)?),
    }
}

fn load_config(path: Option<&Path>) -> Result<MaterializeConfig> {
    let Some(path) = path else {
        return Ok(MaterializeConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
    MaterializeConfig::from_json(&text)
        .wrap_err_with(|| format!("failed to parse config {}", path.display()))
}

fn execution_context(agent_run_id: Option<&str>, entries: &[String]) -> Result<ExecutionContext> {
    let mut context = match agent_run_id {
        Some(id) => ExecutionContext::new().with_agent_run_id(id),
        None => ExecutionContext::for_run(&AgentRunId::new()),
    };
    for entry in entries {
        let (key, value) = ExecutionContext::parse_assignment(entry)
            .wrap_err_with(|| format!("invalid --context entry '{}'", entry))?;
        context.insert(key, value)?;
    }
    Ok(context)
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).wrap_err_with(|| format!("failed to parse {}", path.display()))
}

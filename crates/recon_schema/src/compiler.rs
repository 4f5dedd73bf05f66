//! Compiler from declared schema values to a checked, pre-parsed tree.
//!
//! Compilation is where malformed declarations are rejected: a tool whose
//! schema does not compile cannot be registered. The compiled tree carries
//! parsed reference ASTs so materialization never re-parses templates.

use crate::error::SchemaError;
use crate::taxonomy::{IdentitySpec, NodeRef, TaxonomyMapping, Transform};
use crate::template::{FieldRef, Scope, Template, TemplateError};
use crate::value::{SchemaKind, SchemaValue};
use once_cell::sync::Lazy;
use regex::Regex;

static NODE_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));
static RELATIONSHIP_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid regex"));
static PROPERTY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Compiled schema tree
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    root: CompiledNode,
    mapping_count: usize,
}

impl CompiledSchema {
    /// Root of the tree
    #[must_use]
    pub fn root(&self) -> &CompiledNode {
        &self.root
    }

    /// Number of taxonomy mappings in the tree
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        self.mapping_count
    }

    /// Node types produced by the tree's mappings, in declaration order
    #[must_use]
    pub fn node_types(&self) -> Vec<&str> {
        let mut types = Vec::new();
        self.root.collect_node_types(&mut types);
        types
    }
}

/// Compiled schema position
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledNode {
    /// Value kind
    pub kind: SchemaKind,
    /// Schema path, e.g. `$.results[].certificate`
    pub path: String,
    /// Element schema for arrays
    pub items: Option<Box<CompiledNode>>,
    /// Members in declared order for objects
    pub properties: Vec<(String, CompiledNode)>,
    /// Mapping applied at this position
    pub taxonomy: Option<CompiledMapping>,
}

impl CompiledNode {
    fn collect_node_types<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(mapping) = &self.taxonomy {
            if !out.contains(&mapping.node_type.as_str()) {
                out.push(&mapping.node_type);
            }
        }
        if let Some(items) = &self.items {
            items.collect_node_types(out);
        }
        for (_, member) in &self.properties {
            member.collect_node_types(out);
        }
    }
}

/// Compiled taxonomy mapping
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMapping {
    /// Node type
    pub node_type: String,
    /// Identity rule
    pub identity: CompiledIdentity,
    /// Property copies in declared order
    pub properties: Vec<CompiledProperty>,
    /// Relationships in declared order
    pub relationships: Vec<CompiledRelationship>,
}

/// Compiled identity rule
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledIdentity {
    /// ID template
    Template(Template),
    /// Identifying fields sorted by name
    Fields(Vec<(String, FieldRef)>),
}

impl CompiledIdentity {
    fn references(&self) -> Vec<&FieldRef> {
        match self {
            Self::Template(t) => t.refs().collect(),
            Self::Fields(fields) => fields.iter().map(|(_, r)| r).collect(),
        }
    }
}

/// Compiled property copy
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProperty {
    /// Source reference
    pub source: FieldRef,
    /// Target property name
    pub target: String,
    /// Transform applied to the copied value
    pub transform: Option<Transform>,
}

/// Compiled relationship
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRelationship {
    /// Edge type
    pub relationship: String,
    /// Source endpoint
    pub from: CompiledNodeRef,
    /// Target endpoint
    pub to: CompiledNodeRef,
}

/// Compiled relationship endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledNodeRef {
    /// The enclosing mapping's node
    SelfNode,
    /// Another node, identified from the current scopes
    Foreign {
        /// Node type
        node_type: String,
        /// Identity rule
        identity: CompiledIdentity,
    },
}

/// Non-fatal finding about a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerWarning {
    /// A current-scope reference names a member the object does not declare
    UndeclaredField { path: String, reference: String },
    /// A current-scope path reference on a scalar position
    PathOnScalar { path: String, reference: String },
    /// ID template prefix differs from the mapping's node type
    IdentityPrefixMismatch {
        path: String,
        node_type: String,
        prefix: String,
    },
    /// `_parent` used where no enclosing object exists
    ParentAtRoot { path: String, reference: String },
}

impl std::fmt::Display for CompilerWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UndeclaredField { path, reference } => {
                write!(f, "{}: {} refers to an undeclared field", path, reference)
            }
            Self::PathOnScalar { path, reference } => {
                write!(f, "{}: {} descends into a scalar value", path, reference)
            }
            Self::IdentityPrefixMismatch {
                path,
                node_type,
                prefix,
            } => write!(
                f,
                "{}: identity prefix '{}' differs from node type '{}'",
                path, prefix, node_type
            ),
            Self::ParentAtRoot { path, reference } => {
                write!(f, "{}: {} has no enclosing object", path, reference)
            }
        }
    }
}

/// Output from compiling a schema
#[derive(Debug, Clone)]
pub struct CompilerOutput {
    /// The compiled tree
    pub schema: CompiledSchema,
    /// Compilation warnings
    pub warnings: Vec<CompilerWarning>,
}

/// Compile a schema value
///
/// # Errors
///
/// Returns the first declaration error found
pub fn compile(schema: &SchemaValue) -> Result<CompilerOutput, SchemaError> {
    Compiler::new().compile(schema)
}

/// Compiler for schema values
#[derive(Debug, Default)]
pub struct Compiler {
    warnings: Vec<CompilerWarning>,
    mapping_count: usize,
}

impl Compiler {
    /// Create a new compiler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a schema value
    ///
    /// # Errors
    ///
    /// Returns the first declaration error found
    pub fn compile(mut self, schema: &SchemaValue) -> Result<CompilerOutput, SchemaError> {
        let root = self.compile_value(schema, "$".to_string(), false)?;
        Ok(CompilerOutput {
            schema: CompiledSchema {
                root,
                mapping_count: self.mapping_count,
            },
            warnings: self.warnings,
        })
    }

    fn compile_value(
        &mut self,
        schema: &SchemaValue,
        path: String,
        has_parent: bool,
    ) -> Result<CompiledNode, SchemaError> {
        check_shape(schema, &path)?;

        let taxonomy = match &schema.taxonomy {
            Some(mapping) => {
                self.mapping_count += 1;
                Some(self.compile_mapping(mapping, schema, &path, has_parent)?)
            }
            None => None,
        };

        let items = match &schema.items {
            Some(items) => Some(Box::new(self.compile_value(
                items,
                format!("{}[]", path),
                has_parent,
            )?)),
            None => None,
        };

        let mut properties = Vec::new();
        if let Some(members) = &schema.properties {
            for (name, member) in members {
                let compiled = self.compile_value(member, format!("{}.{}", path, name), true)?;
                properties.push((name.clone(), compiled));
            }
        }

        Ok(CompiledNode {
            kind: schema.kind,
            path,
            items,
            properties,
            taxonomy,
        })
    }

    fn compile_mapping(
        &mut self,
        mapping: &TaxonomyMapping,
        schema: &SchemaValue,
        path: &str,
        has_parent: bool,
    ) -> Result<CompiledMapping, SchemaError> {
        check_node_type(&mapping.node_type, path)?;
        let identity = compile_identity(&mapping.identity, path)?;

        if let CompiledIdentity::Template(template) = &identity {
            if let Some(prefix) = template.type_prefix() {
                if prefix != mapping.node_type {
                    self.warnings.push(CompilerWarning::IdentityPrefixMismatch {
                        path: path.to_string(),
                        node_type: mapping.node_type.clone(),
                        prefix: prefix.to_string(),
                    });
                }
            }
        }

        let mut references: Vec<FieldRef> = identity.references().into_iter().cloned().collect();

        let mut properties = Vec::with_capacity(mapping.properties.len());
        for property in &mapping.properties {
            if !PROPERTY_NAME.is_match(&property.target) {
                return Err(SchemaError::InvalidPropertyName {
                    path: path.to_string(),
                    name: property.target.clone(),
                });
            }
            let source = parse_ref(&property.source, path)?;
            let transform = match &property.transform {
                Some(name) => Some(Transform::from_name(name).ok_or_else(|| {
                    SchemaError::UnknownTransform {
                        path: path.to_string(),
                        name: name.clone(),
                    }
                })?),
                None => None,
            };
            references.push(source.clone());
            properties.push(CompiledProperty {
                source,
                target: property.target.clone(),
                transform,
            });
        }

        let mut relationships = Vec::with_capacity(mapping.relationships.len());
        for relationship in &mapping.relationships {
            if !RELATIONSHIP_TYPE.is_match(&relationship.relationship) {
                return Err(SchemaError::InvalidRelationshipType {
                    path: path.to_string(),
                    name: relationship.relationship.clone(),
                });
            }
            let from = compile_node_ref(&relationship.from, path)?;
            let to = compile_node_ref(&relationship.to, path)?;
            for endpoint in [&from, &to] {
                if let CompiledNodeRef::Foreign { identity, .. } = endpoint {
                    references.extend(identity.references().into_iter().cloned());
                }
            }
            relationships.push(CompiledRelationship {
                relationship: relationship.relationship.clone(),
                from,
                to,
            });
        }

        for reference in &references {
            self.lint_reference(reference, schema, path, has_parent);
        }

        Ok(CompiledMapping {
            node_type: mapping.node_type.clone(),
            identity,
            properties,
            relationships,
        })
    }

    fn lint_reference(
        &mut self,
        reference: &FieldRef,
        schema: &SchemaValue,
        path: &str,
        has_parent: bool,
    ) {
        match reference.scope() {
            Scope::Current => match schema.kind {
                SchemaKind::Object => {
                    if let Some(first) = reference.first_key() {
                        if schema.property(first).is_none() {
                            self.warnings.push(CompilerWarning::UndeclaredField {
                                path: path.to_string(),
                                reference: reference.to_string(),
                            });
                        }
                    }
                }
                SchemaKind::Array => {}
                _ => {
                    if !reference.segments().is_empty() {
                        self.warnings.push(CompilerWarning::PathOnScalar {
                            path: path.to_string(),
                            reference: reference.to_string(),
                        });
                    }
                }
            },
            Scope::Parent if !has_parent => {
                self.warnings.push(CompilerWarning::ParentAtRoot {
                    path: path.to_string(),
                    reference: reference.to_string(),
                });
            }
            _ => {}
        }
    }
}

fn check_shape(schema: &SchemaValue, path: &str) -> Result<(), SchemaError> {
    let path_owned = || path.to_string();
    match schema.kind {
        SchemaKind::Array if schema.items.is_none() => {
            return Err(SchemaError::MissingItems { path: path_owned() })
        }
        SchemaKind::Object if schema.properties.is_none() => {
            return Err(SchemaError::MissingProperties { path: path_owned() })
        }
        _ => {}
    }
    if schema.kind != SchemaKind::Array && schema.items.is_some() {
        return Err(SchemaError::UnexpectedItems { path: path_owned() });
    }
    if schema.kind != SchemaKind::Object
        && (schema.properties.is_some() || !schema.required.is_empty())
    {
        return Err(SchemaError::UnexpectedProperties { path: path_owned() });
    }
    for name in &schema.required {
        if schema.property(name).is_none() {
            return Err(SchemaError::UnknownRequired {
                path: path_owned(),
                name: name.clone(),
            });
        }
    }
    if let (Some(minimum), Some(maximum)) = (schema.minimum, schema.maximum) {
        if minimum > maximum {
            return Err(SchemaError::InvalidRange {
                path: path_owned(),
                minimum,
                maximum,
            });
        }
    }
    Ok(())
}

fn check_node_type(node_type: &str, path: &str) -> Result<(), SchemaError> {
    if NODE_TYPE.is_match(node_type) {
        Ok(())
    } else {
        Err(SchemaError::InvalidNodeType {
            path: path.to_string(),
            name: node_type.to_string(),
        })
    }
}

fn invalid_reference(path: &str, expr: &str, source: TemplateError) -> SchemaError {
    SchemaError::InvalidReference {
        path: path.to_string(),
        expr: expr.to_string(),
        source,
    }
}

fn parse_ref(expr: &str, path: &str) -> Result<FieldRef, SchemaError> {
    FieldRef::parse(expr).map_err(|e| invalid_reference(path, expr, e))
}

fn parse_template(source: &str, path: &str) -> Result<Template, SchemaError> {
    Template::parse(source).map_err(|e| invalid_reference(path, source, e))
}

fn compile_identity(identity: &IdentitySpec, path: &str) -> Result<CompiledIdentity, SchemaError> {
    match identity {
        IdentitySpec::Template(source) => Ok(CompiledIdentity::Template(parse_template(source, path)?)),
        IdentitySpec::Fields(fields) => {
            if fields.is_empty() {
                return Err(SchemaError::EmptyIdentity {
                    path: path.to_string(),
                });
            }
            fields
                .iter()
                .map(|(name, expr)| {
                    if !PROPERTY_NAME.is_match(name) {
                        return Err(SchemaError::InvalidPropertyName {
                            path: path.to_string(),
                            name: name.clone(),
                        });
                    }
                    Ok((name.clone(), parse_ref(expr, path)?))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(CompiledIdentity::Fields)
        }
    }
}

fn compile_node_ref(node_ref: &NodeRef, path: &str) -> Result<CompiledNodeRef, SchemaError> {
    match node_ref {
        NodeRef::SelfNode => Ok(CompiledNodeRef::SelfNode),
        NodeRef::Template { template } => {
            let parsed = parse_template(template, path)?;
            let node_type = parsed
                .type_prefix()
                .filter(|p| NODE_TYPE.is_match(p))
                .ok_or_else(|| SchemaError::UntypedEndpoint {
                    path: path.to_string(),
                    template: template.clone(),
                })?
                .to_string();
            Ok(CompiledNodeRef::Foreign {
                node_type,
                identity: CompiledIdentity::Template(parsed),
            })
        }
        NodeRef::Node {
            node_type,
            identity,
        } => {
            check_node_type(node_type, path)?;
            Ok(CompiledNodeRef::Foreign {
                node_type: node_type.clone(),
                identity: compile_identity(identity, path)?,
            })
        }
    }
}

//! RECON.GRAPH Schema
//!
//! Schema values that describe tool input and output, the taxonomy
//! mappings attached to them, the field-reference syntax those mappings
//! are written in, and the compiler that checks a declaration before any
//! tool runs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod error;
pub mod taxonomy;
pub mod template;
pub mod validate;
pub mod value;

pub use compiler::{
    compile, CompiledIdentity, CompiledMapping, CompiledNode, CompiledNodeRef, CompiledProperty,
    CompiledRelationship, CompiledSchema, Compiler, CompilerOutput, CompilerWarning,
};
pub use error::SchemaError;
pub use taxonomy::{
    node, prop_map, prop_map_with_transform, rel, rel_nodes, self_node, template_node,
    IdentitySpec, NodeRef, PropertyMapping, RelationshipMapping, TaxonomyMapping, Transform,
};
pub use template::{FieldRef, Part, Scope, Segment, Template, TemplateError, DSL_VERSION};
pub use validate::{apply_defaults, validate_document, ValidationError, Validator};
pub use value::{json_type_name, SchemaKind, SchemaValue};

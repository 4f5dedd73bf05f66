//! RECON.GRAPH Tool Layer
//!
//! The uniform tool contract, tool descriptors, descriptor validation, the
//! registry that compiles each tool's taxonomy at registration, and the
//! adapter that runs a tool and materializes its output.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod catalog;
pub mod registry;
pub mod schema;
pub mod trait_;
pub mod validate;

pub use adapter::{builtin::ReplayTool, AdapterError, ToolAdapter, ToolHost, ToolRun};
pub use registry::{RegistryError, ToolEntry, ToolRegistry};
pub use schema::ToolSchema;
pub use trait_::{Tool, ToolError};
pub use validate::{ToolValidator, ValidationError, ValidationRule};

//! RECON.GRAPH Core Types
//!
//! Pure types shared by the schema, taxonomy, and tool crates.
//! Nothing in this crate performs I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod hash;
pub mod id;
pub mod version;

// Re-exports
pub use context::{ExecutionContext, AGENT_RUN_ID};
pub use error::{CoreError, CoreResult};
pub use hash::Hash;
pub use id::AgentRunId;
pub use version::{Version, VersionError};

//! RECON.GRAPH Taxonomy
//!
//! Resolves field references against tool output and materializes the
//! nodes and edges that the output's taxonomy mappings describe.
//!
//! Materialization is pure and synchronous. Each call owns its node and
//! edge sets, so independent calls may run concurrently.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod graph;
pub mod materialize;
pub mod resolver;

pub use config::{MaterializeConfig, DEFAULT_MAX_FANOUT};
pub use graph::{Edge, MaterializeStats, MaterializedGraph, Node};
pub use materialize::{materialize, Materializer};
pub use resolver::{property_value, render, resolve, resolve_all, resolve_expr, stringify, Env, Fanout};

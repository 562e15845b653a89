//! Graph view of the catalog.
//!
//! Two pieces work together here:
//!
//! - [`HierarchyResolver`] - recovers parent/child structure from explicit
//!   references, hierarchy relations and free-text ancestry hints
//! - [`GraphBuilder`] - merges explicit and inferred edges with per-kind
//!   display metadata into a [`GraphData`] node/edge list
//!
//! Both are read-only over the catalog. Persisting inferred edges is a
//! separate, explicit step (`Catalog::materialize_hierarchy`).

mod builder;
mod models;
mod resolver;

pub use builder::{
    GraphBuilder, EPIC_OF_WEIGHT, FEATURE_OF_WEIGHT, MODULE_OF_WEIGHT, PARENT_OF_WEIGHT,
};
pub use models::{EdgeAttributes, GraphData, GraphEdge, GraphNode, NodeAttributes};
pub use resolver::HierarchyResolver;

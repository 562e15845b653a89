//! Output models for the graph view.
//!
//! These are the DTOs handed to rendering/export consumers. The shape is a
//! plain node/edge list; layout and visual presentation are outside the core.

use serde::Serialize;

/// Full graph view: one node per entity plus explicit and inferred edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// A node in the graph view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    /// Canonical entity identifier.
    pub key: String,
    pub attributes: NodeAttributes,
}

/// Display metadata attached to a node, derived from the entity kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeAttributes {
    pub label: String,
    /// Entity kind slug (module, epic, feature, ...).
    pub category: String,
    /// Hex color for rendering.
    pub color: String,
    /// Node size in pixels.
    pub size: u32,
    /// Marks business-critical entities for emphasis.
    pub critical: bool,
}

/// An edge in the graph view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    /// Source node key.
    pub source: String,
    /// Target node key.
    pub target: String,
    pub attributes: EdgeAttributes,
}

/// Edge metadata: relationship slug plus a fixed per-kind weight consumers
/// can use to rank confidence visually.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeAttributes {
    pub relationship: String,
    pub weight: f32,
}

//! Graph view construction.
//!
//! Combines explicit parent references, resolver-inferred ancestry edges and
//! active relations into one node/edge list. Building is read-only: inferred
//! edges are never written back here (see `Catalog::materialize_hierarchy`).

use std::collections::HashSet;

use crate::model::{EntityKind, FunctionalEntity, Relation};

use super::models::{EdgeAttributes, GraphData, GraphEdge, GraphNode, NodeAttributes};
use super::resolver::HierarchyResolver;

/// Fixed weights per inferred edge kind. Deeper hierarchy levels carry
/// higher weights so consumers can rank confidence visually; explicit parent
/// references rank above all inferred levels.
pub const MODULE_OF_WEIGHT: f32 = 1.0;
pub const EPIC_OF_WEIGHT: f32 = 2.0;
pub const FEATURE_OF_WEIGHT: f32 = 3.0;
pub const PARENT_OF_WEIGHT: f32 = 4.0;

/// Hex color per entity kind. Colors are designed to be visually distinct.
fn kind_color(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Module => "#0969da",  // Blue
        EntityKind::Epic => "#8250df",    // Purple
        EntityKind::Feature => "#1a7f37", // Green
        EntityKind::Story => "#9a6700",   // Yellow/Orange
        EntityKind::Page => "#cf222e",    // Red
        EntityKind::Element => "#bf3989", // Pink
        EntityKind::Service => "#57606a", // Gray
    }
}

/// Node size per entity kind: containers render larger than leaves.
fn kind_size(kind: EntityKind) -> u32 {
    match kind {
        EntityKind::Module => 14,
        EntityKind::Epic => 12,
        EntityKind::Feature | EntityKind::Page | EntityKind::Service => 10,
        EntityKind::Story | EntityKind::Element => 8,
    }
}

fn kind_category(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Module => "module",
        EntityKind::Epic => "epic",
        EntityKind::Feature => "feature",
        EntityKind::Story => "story",
        EntityKind::Page => "page",
        EntityKind::Element => "element",
        EntityKind::Service => "service",
    }
}

/// Builder for the combined graph view.
///
/// Deterministic: identical entity/relation input yields an identical edge
/// set across repeated calls, which makes repeated re-synchronization safe.
pub struct GraphBuilder {
    resolver: HierarchyResolver,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    seen_nodes: HashSet<String>,
    seen_edges: HashSet<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            resolver: HierarchyResolver::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            seen_nodes: HashSet::new(),
            seen_edges: HashSet::new(),
        }
    }

    /// Builds the graph view from an entity list and a relation list.
    ///
    /// Edges, in order of emission:
    /// 1. `parent-of` for explicit parent references;
    /// 2. `module-of`/`epic-of`/`feature-of` per ancestry-hint level, only
    ///    when a distinct ancestor resolves;
    /// 3. every active relation verbatim, under its kind slug and stored
    ///    weight.
    ///
    /// Self-loops are never emitted, duplicates on (source, target, kind)
    /// collapse, and edges with an unknown endpoint are skipped.
    pub fn build(mut self, entities: &[FunctionalEntity], relations: &[Relation]) -> GraphData {
        for entity in entities {
            self.add_node(entity);
        }

        for entity in entities {
            if let Some(parent_id) = &entity.parent {
                self.add_edge(parent_id, &entity.id, "parent-of", PARENT_OF_WEIGHT);
            }

            let hint_levels = [
                (&entity.module_hint, EntityKind::Module, "module-of", MODULE_OF_WEIGHT),
                (&entity.epic_hint, EntityKind::Epic, "epic-of", EPIC_OF_WEIGHT),
                (&entity.feature_hint, EntityKind::Feature, "feature-of", FEATURE_OF_WEIGHT),
            ];
            for (hint, expected, relationship, weight) in hint_levels {
                if let Some(ancestor) = self.resolver.find_ancestor(entities, hint, expected) {
                    let ancestor_id = ancestor.id.clone();
                    self.add_edge(&ancestor_id, &entity.id, relationship, weight);
                }
            }
        }

        for relation in relations.iter().filter(|r| r.active) {
            self.add_edge(
                &relation.source,
                &relation.target,
                relation.kind.as_str(),
                relation.weight,
            );
        }

        GraphData {
            nodes: self.nodes,
            edges: self.edges,
        }
    }

    fn add_node(&mut self, entity: &FunctionalEntity) {
        if !self.seen_nodes.insert(entity.id.clone()) {
            return;
        }
        let label = if entity.title.trim().is_empty() {
            entity.id.clone()
        } else {
            entity.title.clone()
        };
        self.nodes.push(GraphNode {
            key: entity.id.clone(),
            attributes: NodeAttributes {
                label,
                category: kind_category(entity.kind).to_string(),
                color: kind_color(entity.kind).to_string(),
                size: kind_size(entity.kind),
                critical: entity.critical,
            },
        });
    }

    fn add_edge(&mut self, source: &str, target: &str, relationship: &str, weight: f32) {
        if source == target {
            return;
        }
        if !self.seen_nodes.contains(source) || !self.seen_nodes.contains(target) {
            return;
        }

        let edge_key = format!("{source}->{target}:{relationship}");
        if self.seen_edges.insert(edge_key) {
            self.edges.push(GraphEdge {
                source: source.to_string(),
                target: target.to_string(),
                attributes: EdgeAttributes {
                    relationship: relationship.to_string(),
                    weight,
                },
            });
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

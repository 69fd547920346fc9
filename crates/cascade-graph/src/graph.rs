//! Infrastructure graph: nodes as infrastructure, edges as weighted
//! directed dependencies.
//!
//! The [`InfrastructureGraph`] is built once from a [`GraphConfig`] and is
//! immutable afterwards except for node condition updates (current load
//! and base risk). Nodes are stored densely, sorted by id, so that every
//! traversal the engine performs visits nodes in the same order.
//!
//! Internally, adjacency lists index edges by position:
//! `outbound[node]` holds the edges leaving a node, `inbound[node]` the
//! edges arriving at it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use cascade_types::{DependencyEdge, InfrastructureNode, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// On-disk description of a region's infrastructure.
///
/// Every node and edge field is mandatory; there are no defaults for
/// infrastructure data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Human-readable region name.
    #[serde(default = "default_region")]
    pub region: String,
    /// Infrastructure nodes.
    pub nodes: Vec<InfrastructureNode>,
    /// Dependency edges.
    #[serde(default)]
    pub edges: Vec<DependencyEdge>,
}

fn default_region() -> String {
    "unnamed region".to_owned()
}

impl GraphConfig {
    /// Load a graph description from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Io`] if the file cannot be read, or
    /// [`GraphError::Yaml`] if it does not match the expected shape.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a graph description from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Yaml`] if the string does not match the
    /// expected shape.
    pub fn parse(yaml: &str) -> Result<Self, GraphError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// The region's dependency graph.
#[derive(Debug, Clone, PartialEq)]
pub struct InfrastructureGraph {
    /// Region name from the config.
    region: String,
    /// Nodes sorted by id.
    nodes: Vec<InfrastructureNode>,
    /// Node id -> position in `nodes`.
    index: BTreeMap<NodeId, usize>,
    /// Edges in config order.
    edges: Vec<DependencyEdge>,
    /// Dense `(source, target)` positions for each edge.
    ends: Vec<(usize, usize)>,
    /// Outbound adjacency: node position -> edge positions.
    outbound: Vec<Vec<usize>>,
    /// Inbound adjacency: node position -> edge positions.
    inbound: Vec<Vec<usize>>,
}

impl InfrastructureGraph {
    /// Build and validate a graph.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DuplicateNode`] for repeated node ids
    /// - [`GraphError::OutOfRange`] for base risk outside `[0, 1]`,
    ///   negative capacity or load, invalid coordinates, or edge weights
    ///   outside `[0, 1]`
    /// - [`GraphError::SelfLoop`], [`GraphError::DanglingEdge`], or
    ///   [`GraphError::DuplicateEdge`] for malformed edges
    pub fn load(config: GraphConfig) -> Result<Self, GraphError> {
        let GraphConfig {
            region,
            mut nodes,
            edges,
        } = config;

        for node in &nodes {
            validate_node(node)?;
        }
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut index = BTreeMap::new();
        for (pos, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), pos).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut outbound = vec![Vec::new(); nodes.len()];
        let mut inbound = vec![Vec::new(); nodes.len()];
        let mut ends = Vec::with_capacity(edges.len());
        let mut seen = BTreeSet::new();

        for (pos, edge) in edges.iter().enumerate() {
            let (from, to) = resolve_edge(&index, edge)?;
            if !seen.insert((from, to)) {
                return Err(GraphError::DuplicateEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                });
            }
            if let Some(list) = outbound.get_mut(from) {
                list.push(pos);
            }
            if let Some(list) = inbound.get_mut(to) {
                list.push(pos);
            }
            ends.push((from, to));
        }

        tracing::info!(
            region = %region,
            nodes = nodes.len(),
            edges = edges.len(),
            "Infrastructure graph loaded"
        );

        Ok(Self {
            region,
            nodes,
            index,
            edges,
            ends,
            outbound,
            inbound,
        })
    }

    /// Load and validate a graph from a YAML file.
    ///
    /// # Errors
    ///
    /// Any error from [`GraphConfig::from_file`] or [`Self::load`].
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        Self::load(GraphConfig::from_file(path)?)
    }

    // -------------------------------------------------------------------
    // Node queries
    // -------------------------------------------------------------------

    /// Region name.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Look up a node by id.
    pub fn get_node(&self, id: &str) -> Option<&InfrastructureNode> {
        self.index_of(id).and_then(|pos| self.nodes.get(pos))
    }

    /// Look up a node by id, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] for an unknown id.
    pub fn node(&self, id: &str) -> Result<&InfrastructureNode, GraphError> {
        self.get_node(id)
            .ok_or_else(|| GraphError::NodeNotFound(NodeId::from(id)))
    }

    /// Nodes that depend on `id`, with the edge leading to each.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] for an unknown id.
    pub fn get_neighbors(
        &self,
        id: &str,
    ) -> Result<Vec<(&DependencyEdge, &InfrastructureNode)>, GraphError> {
        let pos = self
            .index_of(id)
            .ok_or_else(|| GraphError::NodeNotFound(NodeId::from(id)))?;
        Ok(self
            .outbound
            .get(pos)
            .into_iter()
            .flatten()
            .filter_map(|&e| {
                let edge = self.edges.get(e)?;
                let (_, to) = self.ends.get(e)?;
                Some((edge, self.nodes.get(*to)?))
            })
            .collect())
    }

    /// Iterate over all nodes in id order.
    ///
    /// Each call returns a fresh iterator, so the sequence can be
    /// restarted at will.
    pub fn iterate_nodes(&self) -> impl Iterator<Item = &InfrastructureNode> {
        self.nodes.iter()
    }

    /// Iterate over all edges in config order.
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // -------------------------------------------------------------------
    // Dense access for traversal
    // -------------------------------------------------------------------

    /// Position of a node in id order.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Node at a dense position.
    pub fn node_at(&self, pos: usize) -> Option<&InfrastructureNode> {
        self.nodes.get(pos)
    }

    /// Edges arriving at the node at `pos`, as `(source position, edge)`.
    pub fn inbound_at(&self, pos: usize) -> impl Iterator<Item = (usize, &DependencyEdge)> {
        self.inbound.get(pos).into_iter().flatten().filter_map(|&e| {
            let (from, _) = self.ends.get(e)?;
            Some((*from, self.edges.get(e)?))
        })
    }

    /// Edges leaving the node at `pos`, as `(target position, edge)`.
    pub fn outbound_at(&self, pos: usize) -> impl Iterator<Item = (usize, &DependencyEdge)> {
        self.outbound.get(pos).into_iter().flatten().filter_map(|&e| {
            let (_, to) = self.ends.get(e)?;
            Some((*to, self.edges.get(e)?))
        })
    }

    // -------------------------------------------------------------------
    // Condition updates
    // -------------------------------------------------------------------

    /// Update a node's current load and/or base risk.
    ///
    /// Returns `true` if anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeNotFound`] for an unknown id, or
    /// [`GraphError::OutOfRange`] if a value is invalid. On error the
    /// node is left untouched.
    pub fn update_condition(
        &mut self,
        id: &str,
        current_load: Option<f64>,
        base_risk: Option<f64>,
    ) -> Result<bool, GraphError> {
        let pos = self
            .index_of(id)
            .ok_or_else(|| GraphError::NodeNotFound(NodeId::from(id)))?;
        let node = self
            .nodes
            .get_mut(pos)
            .ok_or_else(|| GraphError::NodeNotFound(NodeId::from(id)))?;

        let mut updated = node.clone();
        if let Some(load) = current_load {
            updated.current_load = load;
        }
        if let Some(risk) = base_risk {
            updated.base_risk = risk;
        }
        validate_node(&updated)?;

        let changed = updated != *node;
        *node = updated;
        Ok(changed)
    }
}

fn resolve_edge(
    index: &BTreeMap<NodeId, usize>,
    edge: &DependencyEdge,
) -> Result<(usize, usize), GraphError> {
    let owner = || format!("{} -> {}", edge.source, edge.target);

    if edge.source == edge.target {
        return Err(GraphError::SelfLoop(edge.source.clone()));
    }
    if !(0.0..=1.0).contains(&edge.propagation_weight) {
        return Err(GraphError::OutOfRange {
            field: "propagation_weight",
            owner: owner(),
            value: edge.propagation_weight,
            expected: "0..=1",
        });
    }

    let dangling = |missing: &NodeId| GraphError::DanglingEdge {
        from: edge.source.clone(),
        to: edge.target.clone(),
        missing: missing.clone(),
    };
    let from = index
        .get(&edge.source)
        .copied()
        .ok_or_else(|| dangling(&edge.source))?;
    let to = index
        .get(&edge.target)
        .copied()
        .ok_or_else(|| dangling(&edge.target))?;
    Ok((from, to))
}

fn validate_node(node: &InfrastructureNode) -> Result<(), GraphError> {
    let out_of_range = |field, value, expected| GraphError::OutOfRange {
        field,
        owner: node.id.to_string(),
        value,
        expected,
    };

    if !(0.0..=1.0).contains(&node.base_risk) {
        return Err(out_of_range("base_risk", node.base_risk, "0..=1"));
    }
    if !node.capacity.is_finite() || node.capacity < 0.0 {
        return Err(out_of_range("capacity", node.capacity, "finite and >= 0"));
    }
    if !node.current_load.is_finite() || node.current_load < 0.0 {
        return Err(out_of_range(
            "current_load",
            node.current_load,
            "finite and >= 0",
        ));
    }
    if !node.location.is_valid() {
        let value = if (-90.0..=90.0).contains(&node.location.lat) {
            node.location.lon
        } else {
            node.location.lat
        };
        return Err(out_of_range("location", value, "lat -90..=90, lon -180..=180"));
    }
    Ok(())
}

//! Error types for the `cascade-graph` crate.
//!
//! Every load-time variant is fatal: a region whose graph fails to load
//! must not be served.

use cascade_types::NodeId;

/// Errors that can occur while loading or querying the infrastructure graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Failed to read the graph file from disk.
    #[error("failed to read graph file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse the graph YAML.
    #[error("failed to parse graph YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },

    /// Two nodes share an identifier.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// The same source/target pair appears on more than one edge.
    #[error("duplicate edge {from} -> {to}")]
    DuplicateEdge {
        /// Edge source.
        from: NodeId,
        /// Edge target.
        to: NodeId,
    },

    /// An edge references a node that does not exist.
    #[error("edge {from} -> {to} references unknown node {missing}")]
    DanglingEdge {
        /// Edge source.
        from: NodeId,
        /// Edge target.
        to: NodeId,
        /// The endpoint that is not defined.
        missing: NodeId,
    },

    /// An edge connects a node to itself.
    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),

    /// A numeric field is outside its allowed range.
    #[error("{field} of {owner} is {value}, expected {expected}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Node id or `source -> target` of the offending entity.
        owner: String,
        /// The rejected value.
        value: f64,
        /// Human-readable description of the allowed range.
        expected: &'static str,
    },

    /// A node was not found in the graph.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
}

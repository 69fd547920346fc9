//! Type-safe identifier wrappers.
//!
//! Hazard events are identified by UUID v7 (time-ordered) so that listings
//! sort by detection order. Infrastructure nodes keep the human-assigned
//! string identifiers from the region's graph configuration
//! (`power_grid_1`, `hospital_1`, ...).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an injected hazard event.
    HazardEventId
}

/// Identifier of an infrastructure node, as assigned in the graph config.
///
/// Ordering is lexicographic and is used as the final tie-breaker
/// everywhere the engine sorts nodes, which keeps snapshots deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl core::borrow::Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_ids_are_unique() {
        let a = HazardEventId::new();
        let b = HazardEventId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn hazard_id_parses_from_display() {
        let id = HazardEventId::new();
        let parsed: Result<HazardEventId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
    }

    #[test]
    fn node_id_serializes_as_plain_string() {
        let id = NodeId::from("power_grid_1");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"power_grid_1\""));
    }

    #[test]
    fn node_ids_order_lexicographically() {
        let mut ids = vec![NodeId::from("water_1"), NodeId::from("hospital_1")];
        ids.sort();
        assert_eq!(ids.first().map(NodeId::as_str), Some("hospital_1"));
    }
}

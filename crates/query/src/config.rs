//! Update configs.
//!
//! An update config tells the store how to fold a payload into existing
//! records beyond plain field merging: inserting an edge into a connection,
//! or removing a node or an edge from one.

use crate::node::QueryNode;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use tessera_core::DataId;

/// How a new edge is placed into a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeOperation {
    /// Add the edge at the end.
    Append,
    /// Add the edge at the front.
    Prepend,
    /// Leave the connection untouched.
    Ignore,
    /// Remove the edge's node from the connection.
    Remove,
    /// The connection must be refetched; nothing is written locally.
    Refetch,
}

/// Range behaviors keyed by the connection's call key (see
/// `FieldNode::call_key`). The empty key matches a connection without calls.
///
/// A store decides which key it looks up. `MemoryStore` keeps connections
/// without call arguments and only ever reads the `""` entry, so a map
/// holding just `first(10)` fails there with `MissingRangeBehavior`.
pub type RangeBehaviors = BTreeMap<String, RangeOperation>;

/// The kind of an update config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKind {
    RangeAdd,
    NodeDelete,
    RangeDelete,
    RequiredChildren,
    FieldsChange,
}

impl ConfigKind {
    /// Returns the conventional upper-case name, e.g. `RANGE_ADD`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::RangeAdd => "RANGE_ADD",
            ConfigKind::NodeDelete => "NODE_DELETE",
            ConfigKind::RangeDelete => "RANGE_DELETE",
            ConfigKind::RequiredChildren => "REQUIRED_CHILDREN",
            ConfigKind::FieldsChange => "FIELDS_CHANGE",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative cache-update instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateConfig {
    /// Insert a new edge into `parent_id.connection_name`.
    RangeAdd {
        parent_name: String,
        parent_id: DataId,
        connection_name: String,
        edge_name: String,
        range_behaviors: RangeBehaviors,
    },
    /// Delete a node and drop its edge from the connection.
    NodeDelete {
        parent_name: String,
        parent_id: DataId,
        connection_name: String,
        deleted_id_field_name: String,
    },
    /// Drop an edge from a connection, keeping the node.
    RangeDelete {
        parent_name: String,
        parent_id: DataId,
        connection_name: String,
        deleted_id_field_name: String,
        path_to_connection: Vec<String>,
    },
    /// Extra selections to always fetch.
    RequiredChildren { children: Vec<QueryNode> },
    /// Records whose fields change, by field name.
    FieldsChange { field_ids: BTreeMap<String, DataId> },
}

impl UpdateConfig {
    /// Creates a `RANGE_ADD` config.
    pub fn range_add(
        parent_name: impl Into<String>,
        parent_id: impl Into<DataId>,
        connection_name: impl Into<String>,
        edge_name: impl Into<String>,
        range_behaviors: RangeBehaviors,
    ) -> Self {
        UpdateConfig::RangeAdd {
            parent_name: parent_name.into(),
            parent_id: parent_id.into(),
            connection_name: connection_name.into(),
            edge_name: edge_name.into(),
            range_behaviors,
        }
    }

    /// Creates a `NODE_DELETE` config.
    pub fn node_delete(
        parent_name: impl Into<String>,
        parent_id: impl Into<DataId>,
        connection_name: impl Into<String>,
        deleted_id_field_name: impl Into<String>,
    ) -> Self {
        UpdateConfig::NodeDelete {
            parent_name: parent_name.into(),
            parent_id: parent_id.into(),
            connection_name: connection_name.into(),
            deleted_id_field_name: deleted_id_field_name.into(),
        }
    }

    /// Creates a `RANGE_DELETE` config.
    pub fn range_delete(
        parent_name: impl Into<String>,
        parent_id: impl Into<DataId>,
        connection_name: impl Into<String>,
        deleted_id_field_name: impl Into<String>,
        path_to_connection: Vec<String>,
    ) -> Self {
        UpdateConfig::RangeDelete {
            parent_name: parent_name.into(),
            parent_id: parent_id.into(),
            connection_name: connection_name.into(),
            deleted_id_field_name: deleted_id_field_name.into(),
            path_to_connection,
        }
    }

    /// Returns the config's kind.
    pub fn kind(&self) -> ConfigKind {
        match self {
            UpdateConfig::RangeAdd { .. } => ConfigKind::RangeAdd,
            UpdateConfig::NodeDelete { .. } => ConfigKind::NodeDelete,
            UpdateConfig::RangeDelete { .. } => ConfigKind::RangeDelete,
            UpdateConfig::RequiredChildren { .. } => ConfigKind::RequiredChildren,
            UpdateConfig::FieldsChange { .. } => ConfigKind::FieldsChange,
        }
    }
}

/// Shorthand for a behavior map with a single entry.
pub fn range_behavior(call_key: impl Into<String>, operation: RangeOperation) -> RangeBehaviors {
    let mut behaviors = RangeBehaviors::new();
    behaviors.insert(call_key.into(), operation);
    behaviors
}

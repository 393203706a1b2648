//! Write targets for the pipelines.
//!
//! - Raw sink: keyed rows grouped by database and table, insert-or-overwrite.
//! - Modeled sink: typed nodes (a view-tagged property bag plus typed
//!   relations to other nodes), upsert by external id; list-by-view queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A flattened raw record. `columns` is a sorted map so identical upstream
/// data always serializes identically.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub key: String,
    pub columns: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId {
    pub space: String,
    pub external_id: String,
    pub version: String,
}

impl ViewId {
    pub fn new(space: &str, external_id: &str, version: &str) -> Self {
        ViewId {
            space: space.to_string(),
            external_id: external_id.to_string(),
            version: version.to_string(),
        }
    }
}

/// Typed link to another node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    pub space: String,
    pub external_id: String,
}

impl NodeRef {
    pub fn new(space: &str, external_id: impl Into<String>) -> Self {
        NodeRef {
            space: space.to_string(),
            external_id: external_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeApply {
    pub space: String,
    pub external_id: String,
    pub view: ViewId,
    pub properties: Map<String, Value>,
    pub relations: BTreeMap<String, NodeRef>,
}

/// A node as read back from the modeled sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub space: String,
    pub external_id: String,
    pub view: ViewId,
    pub properties: Map<String, Value>,
    pub relations: BTreeMap<String, NodeRef>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("sink rejected write: {0}")]
    Rejected(String),
    #[error("malformed stored data: {0}")]
    Malformed(String),
}

pub trait RawSink {
    /// Insert or overwrite `rows` in one all-or-nothing call.
    fn insert_rows(&mut self, database: &str, table: &str, rows: &[RawRow]) -> Result<usize, WriteError>;
}

pub trait ModeledSink {
    /// Upsert `nodes` (and replace their relations) in one all-or-nothing call.
    fn apply_nodes(&mut self, nodes: &[NodeApply]) -> Result<usize, WriteError>;

    /// Nodes tagged with `view`, ordered by external id, at most `limit`.
    fn list_nodes(&mut self, view: &ViewId, limit: usize) -> Result<Vec<Node>, WriteError>;

    /// Like `list_nodes`, restricted to nodes whose `relation` points at `target`.
    fn list_linked(
        &mut self,
        view: &ViewId,
        relation: &str,
        target: &NodeRef,
        limit: usize,
    ) -> Result<Vec<Node>, WriteError>;
}

//! The metadata document written next to an instrumented file.
//!
//! It lets a replay tool map the references reported at run time back to
//! the source: every event with its reference, and every original node
//! with its byte range, parent and statement flag.

use serde::{Deserialize, Serialize};

use cstep_core::{ContentHash, SourceRange};
use cstep_cst::SourceTree;

use crate::error::InstrumentError;
use crate::event::{NotificationRecord, NotifyRegistry};
use crate::scope::is_statement;

/// Version of the metadata document layout.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// One original node of the instrumented file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: u32,
    /// `null` for the translation unit.
    pub parent_id: Option<u32>,
    #[serde(rename = "type")]
    pub kind: String,
    pub range: SourceRange,
    pub is_statement: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub schema_version: u32,
    /// Path of the input file as given.
    pub file: String,
    /// SHA-256 of the original source.
    pub source_hash: String,
    pub notifications: Vec<NotificationRecord>,
    pub nodes: Vec<NodeRecord>,
}

impl Metadata {
    /// Collect the records of a finished pass. Fails if any event is
    /// missing a field its action requires.
    pub fn collect(file: &str, tree: &SourceTree, events: &NotifyRegistry) -> Result<Self, InstrumentError> {
        let nodes = tree
            .original_nodes()
            .filter_map(|h| {
                let span = tree.span(h)?;
                Some(NodeRecord {
                    id: tree.node_id(h).0,
                    parent_id: tree.parent(h).map(|p| tree.node_id(p).0),
                    kind: tree.kind_name(h).to_string(),
                    range: SourceRange::from(span),
                    is_statement: is_statement(tree, h),
                })
            })
            .collect();
        Ok(Metadata {
            schema_version: METADATA_SCHEMA_VERSION,
            file: file.to_string(),
            source_hash: ContentHash::compute(tree.source().as_bytes()).0,
            notifications: events.records()?,
            nodes,
        })
    }

    pub fn node(&self, id: u32) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

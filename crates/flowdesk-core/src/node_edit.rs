use crate::{Node, Workflow};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Malformed parameters: {0}")]
    MalformedParameters(#[source] serde_json::Error),

    #[error("Node {index} does not exist (workflow has {len} nodes)")]
    NodeIndexOutOfRange { index: usize, len: usize },
}

/// A pending edit of one node, as typed by the operator.
///
/// `parameters` is raw JSON text; it is only parsed when the edit is
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEdit {
    pub index: usize,
    pub name: String,
    pub node_type: String,
    pub parameters: String,
}

impl NodeEdit {
    /// Prefills an edit with the node's current values.
    pub fn from_node(index: usize, node: &Node) -> Self {
        Self {
            index,
            name: node.name.clone(),
            node_type: node.node_type.clone(),
            parameters: render_parameters(node),
        }
    }
}

/// Pretty-printed parameters, the editable starting point for a node edit.
pub fn render_parameters(node: &Node) -> String {
    serde_json::to_string_pretty(&node.parameters).unwrap_or_else(|_| "{}".to_string())
}

pub fn parse_parameters(text: &str) -> Result<Value, EditError> {
    serde_json::from_str(text).map_err(EditError::MalformedParameters)
}

/// Returns a copy of `workflow` with `edit` applied to one node.
///
/// The node keeps its id, credentials and any other fields; its position in
/// the sequence does not change. `workflow` itself is never modified, so a
/// failed edit or a failed submit leaves the caller's copy as it was.
pub fn apply_node_edit(workflow: &Workflow, edit: &NodeEdit) -> Result<Workflow, EditError> {
    let len = workflow.nodes.len();
    if edit.index >= len {
        return Err(EditError::NodeIndexOutOfRange {
            index: edit.index,
            len,
        });
    }
    let parameters = parse_parameters(&edit.parameters)?;

    let mut updated = workflow.clone();
    let node = &mut updated.nodes[edit.index];
    node.name = edit.name.clone();
    node.node_type = edit.node_type.clone();
    node.parameters = parameters;
    Ok(updated)
}

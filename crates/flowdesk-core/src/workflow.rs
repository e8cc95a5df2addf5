use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Server-assigned identifier. Some deployments hand out numeric ids, most
/// hand out strings; both are kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{}", n),
            ResourceId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        ResourceId::Text(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        ResourceId::Text(s)
    }
}

impl From<i64> for ResourceId {
    fn from(n: i64) -> Self {
        ResourceId::Number(n)
    }
}

impl ResourceId {
    /// Compares ids by their textual form, so `1` and `"1"` are the same
    /// workflow regardless of which encoding a given endpoint used.
    pub fn same_as(&self, other: &ResourceId) -> bool {
        self.to_string() == other.to_string()
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// A workflow as stored on the server.
///
/// Only the fields this tool reads are typed. Everything else the server
/// returned (connections, settings, tags, ...) is kept in `extra` and written
/// back untouched, because updates send the whole object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workflow {
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }
}

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "empty_object")]
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            node_type: node_type.into(),
            parameters: empty_object(),
            credentials: None,
            extra: Map::new(),
        }
    }
}

/// The slice of a workflow the list endpoint is consumed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// List envelope returned by every collection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn single(data: Vec<T>) -> Self {
        Self {
            data,
            next_cursor: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::single(Vec::new())
    }
}

// =============================================================================
// Executions
// =============================================================================

/// Execution state as the server reports it. Values this client does not
/// know are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    Success,
    Error,
    Running,
    Waiting,
    Canceled,
    Crashed,
    New,
    Other(String),
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Waiting => "waiting",
            ExecutionStatus::Canceled => "canceled",
            ExecutionStatus::Crashed => "crashed",
            ExecutionStatus::New => "new",
            ExecutionStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ExecutionStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "success" => ExecutionStatus::Success,
            "error" => ExecutionStatus::Error,
            "running" => ExecutionStatus::Running,
            "waiting" => ExecutionStatus::Waiting,
            "canceled" => ExecutionStatus::Canceled,
            "crashed" => ExecutionStatus::Crashed,
            "new" => ExecutionStatus::New,
            _ => ExecutionStatus::Other(raw),
        }
    }
}

impl From<ExecutionStatus> for String {
    fn from(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ExecutionStatus::from(s.to_string()))
    }
}

/// One historical run of a workflow. Read-only.
///
/// Absent fields stay absent when serialized and unknown ones are kept in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ExecutionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionError>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_workflow() -> Value {
        json!({
            "id": "1",
            "name": "Demo",
            "active": false,
            "nodes": [
                {
                    "id": "n1",
                    "name": "Start",
                    "type": "trigger",
                    "parameters": {},
                    "position": [250, 300],
                    "typeVersion": 1
                },
                {
                    "id": "n2",
                    "name": "Fetch",
                    "type": "n8n-nodes-base.httpRequest",
                    "parameters": {"url": "https://example.com", "options": {"timeout": 30}},
                    "credentials": {"httpBasicAuth": {"id": "7", "name": "Basic"}}
                }
            ],
            "connections": {"Start": {"main": [[{"node": "Fetch", "type": "main", "index": 0}]]}},
            "settings": {"executionOrder": "v1"}
        })
    }

    #[test]
    fn test_workflow_keeps_unknown_fields() {
        let original = sample_workflow();
        let workflow: Workflow = serde_json::from_value(original.clone()).expect("parse");

        assert_eq!(workflow.id, ResourceId::from("1"));
        assert_eq!(workflow.nodes.len(), 2);
        assert!(workflow.extra.contains_key("connections"));
        assert!(workflow.nodes[0].extra.contains_key("position"));

        let back = serde_json::to_value(&workflow).expect("serialize");
        assert_eq!(back, original);
    }

    #[test]
    fn test_node_defaults() {
        let node: Node =
            serde_json::from_value(json!({"name": "Bare", "type": "noop"})).expect("parse");
        assert_eq!(node.id, None);
        assert_eq!(node.parameters, json!({}));
        assert_eq!(node.credentials, None);

        let value = serde_json::to_value(&node).expect("serialize");
        assert!(value.get("id").is_none());
        assert!(value.get("credentials").is_none());
    }

    #[test]
    fn test_parameters_text_round_trip() {
        let workflow: Workflow = serde_json::from_value(sample_workflow()).expect("parse");
        for node in &workflow.nodes {
            let text = serde_json::to_string_pretty(&node.parameters).expect("render");
            let parsed: Value = serde_json::from_str(&text).expect("reparse");
            assert_eq!(parsed, node.parameters);
        }
    }

    #[test]
    fn test_resource_id_forms() {
        let numeric: ResourceId = serde_json::from_value(json!(42)).expect("number");
        let text: ResourceId = serde_json::from_value(json!("42")).expect("text");
        assert_eq!(numeric, ResourceId::Number(42));
        assert_eq!(text, ResourceId::Text("42".to_string()));
        assert_ne!(numeric, text);
        assert!(numeric.same_as(&text));
        assert_eq!(numeric.to_string(), "42");
    }

    #[test]
    fn test_page_envelope() {
        let page: Page<WorkflowSummary> = serde_json::from_value(json!({
            "data": [
                {"id": "1", "name": "Demo", "active": true, "nodes": []},
                {"id": 2, "name": "Other"}
            ],
            "nextCursor": "abc"
        }))
        .expect("parse");
        assert_eq!(page.data.len(), 2);
        assert!(page.data[0].active);
        assert!(!page.data[1].active);
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));

        let empty: Page<WorkflowSummary> = serde_json::from_value(json!({})).expect("empty");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_execution_parsing() {
        let execution: Execution = serde_json::from_value(json!({
            "id": 1001,
            "status": "error",
            "startedAt": "2024-05-01T10:00:00.000Z",
            "stoppedAt": null,
            "mode": "trigger",
            "finished": false,
            "workflowId": "1",
            "error": {"message": "boom", "node": "Fetch"}
        }))
        .expect("parse");
        assert_eq!(execution.status, Some(ExecutionStatus::Error));
        assert!(execution.started_at.is_some());
        assert_eq!(execution.stopped_at, None);
        let error = execution.error.expect("error payload");
        assert_eq!(error.message.as_deref(), Some("boom"));
        assert!(error.extra.contains_key("node"));
    }

    #[test]
    fn test_execution_keeps_server_fields() {
        let raw = json!({"id": "7", "status": "queued", "retryOf": "5"});
        let execution: Execution = serde_json::from_value(raw.clone()).expect("parse");
        assert_eq!(
            execution.status,
            Some(ExecutionStatus::Other("queued".to_string()))
        );
        assert_eq!(execution.extra.get("retryOf"), Some(&json!("5")));
        assert_eq!(serde_json::to_value(&execution).expect("serialize"), raw);

        let missing: Execution = serde_json::from_value(json!({"id": "10"})).expect("parse");
        assert_eq!(missing.status, None);
    }

    #[test]
    fn test_execution_status_from_str() {
        assert_eq!(
            "SUCCESS".parse::<ExecutionStatus>(),
            Ok(ExecutionStatus::Success)
        );
        assert_eq!(
            "Queued".parse::<ExecutionStatus>().map(|s| s.to_string()),
            Ok("Queued".to_string())
        );
    }
}

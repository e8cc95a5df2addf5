//! Node editor round-trip: edit one node locally, write the whole workflow
//! back.

use crate::workflows::update_workflow;
use crate::{ApiError, Gateway, UpdateMethod};
use flowdesk_core::{EditError, Node, NodeEdit, Workflow, apply_node_edit};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum NodeEditError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub fn load_nodes(workflow: &Workflow) -> &[Node] {
    &workflow.nodes
}

/// Applies `edit` to a copy of `workflow` and submits the copy.
///
/// Malformed parameters or a stale index fail before any request is made.
/// `workflow` is never modified; on success the caller should re-fetch
/// rather than trust either copy.
pub async fn edit_node<G: Gateway>(
    gateway: &G,
    workflow: &Workflow,
    edit: &NodeEdit,
    method: UpdateMethod,
) -> Result<Option<Workflow>, NodeEditError> {
    let updated = apply_node_edit(workflow, edit).inspect_err(|e| {
        warn!(workflow = %workflow.id, index = edit.index, "Node edit rejected: {}", e);
    })?;
    Ok(update_workflow(gateway, &updated, method).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;
    use crate::test_stubs::StubServer;
    use crate::workflows::get_workflow;
    use flowdesk_core::ResourceId;
    use serde_json::{Value, json};

    fn demo() -> Value {
        json!({
            "id": "1",
            "name": "Demo",
            "active": false,
            "nodes": [
                {"id": "n1", "name": "Start", "type": "trigger", "parameters": {}},
                {
                    "id": "n2",
                    "name": "Request",
                    "type": "n8n-nodes-base.httpRequest",
                    "parameters": {"url": "https://old.example.com"},
                    "credentials": {"httpHeaderAuth": {"id": "5", "name": "Header"}},
                    "position": [440, 300]
                },
                {"id": "n3", "name": "Done", "type": "noop", "parameters": {"note": "end"}}
            ],
            "connections": {"Start": {"main": [[{"node": "Request", "type": "main", "index": 0}]]}}
        })
    }

    fn edit(index: usize, parameters: &str) -> NodeEdit {
        NodeEdit {
            index,
            name: "Call API".to_string(),
            node_type: "n8n-nodes-base.httpRequestV2".to_string(),
            parameters: parameters.to_string(),
        }
    }

    #[tokio::test]
    async fn test_edit_sends_whole_workflow_with_node_replaced() {
        let server = StubServer::with_workflows(vec![demo()]);
        let workflow = get_workflow(&server, &ResourceId::from("1"))
            .await
            .expect("get");
        let before: Vec<Value> = workflow
            .nodes
            .iter()
            .map(|n| serde_json::to_value(n).expect("serialize"))
            .collect();

        edit_node(
            &server,
            &workflow,
            &edit(1, r#"{"url": "https://new.example.com", "method": "POST"}"#),
            UpdateMethod::Patch,
        )
        .await
        .expect("edit");

        let patch = server.calls().pop().expect("patch call");
        assert_eq!(patch.method, Method::Patch);
        assert_eq!(patch.endpoint(), "workflows/1");
        let body = patch.body.expect("body");
        let nodes = body["nodes"].as_array().expect("nodes");
        assert_eq!(nodes.len(), 3);

        let target = &nodes[1];
        assert_eq!(target["id"], "n2");
        assert_eq!(target["name"], "Call API");
        assert_eq!(target["type"], "n8n-nodes-base.httpRequestV2");
        assert_eq!(
            target["parameters"],
            json!({"url": "https://new.example.com", "method": "POST"})
        );
        assert_eq!(
            target["credentials"],
            json!({"httpHeaderAuth": {"id": "5", "name": "Header"}})
        );
        assert_eq!(target["position"], json!([440, 300]));

        for i in [0, 2] {
            assert_eq!(nodes[i], before[i]);
        }
        assert_eq!(body["connections"], demo()["connections"]);
        assert_eq!(body["name"], "Demo");
    }

    #[tokio::test]
    async fn test_malformed_parameters_make_no_call() {
        let server = StubServer::with_workflows(vec![demo()]);
        let workflow = get_workflow(&server, &ResourceId::from("1"))
            .await
            .expect("get");
        let snapshot = workflow.clone();
        let calls_before = server.call_count();

        let err = edit_node(&server, &workflow, &edit(1, "{\"url\": "), UpdateMethod::Patch)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NodeEditError::Edit(EditError::MalformedParameters(_))
        ));
        assert_eq!(server.call_count(), calls_before);
        assert_eq!(workflow, snapshot);
        assert_eq!(
            server.workflow("1").expect("workflow")["nodes"][1]["name"],
            "Request"
        );
    }

    #[tokio::test]
    async fn test_stale_index_makes_no_call() {
        let server = StubServer::with_workflows(vec![demo()]);
        let workflow = get_workflow(&server, &ResourceId::from("1"))
            .await
            .expect("get");
        let calls_before = server.call_count();

        let err = edit_node(&server, &workflow, &edit(7, "{}"), UpdateMethod::Patch)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NodeEditError::Edit(EditError::NodeIndexOutOfRange { index: 7, len: 3 })
        ));
        assert_eq!(server.call_count(), calls_before);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_reported() {
        let server = StubServer::with_workflows(vec![demo()]);
        let workflow = get_workflow(&server, &ResourceId::from("1"))
            .await
            .expect("get");
        server.fail_next(400, "request/body must NOT have additional properties");

        let err = edit_node(&server, &workflow, &edit(0, "{}"), UpdateMethod::Patch)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeEditError::Api(ApiError::Status { status: 400, .. })));
        assert_eq!(
            server.workflow("1").expect("workflow")["nodes"][0]["name"],
            "Start"
        );
        assert_eq!(workflow.nodes[0].name, "Start");
    }

    #[test]
    fn test_load_nodes_keeps_server_order() {
        let workflow: Workflow = serde_json::from_value(demo()).expect("workflow");
        let names: Vec<_> = load_nodes(&workflow)
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["Start", "Request", "Done"]);
    }
}

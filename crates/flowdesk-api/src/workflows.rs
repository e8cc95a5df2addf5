//! Workflow collection and detail operations.

use crate::types::{decode, decode_optional};
use crate::{ApiError, ApiRequest, Gateway, Method, UpdateMethod};
use flowdesk_core::{Page, ResourceId, Workflow, WorkflowQuery, WorkflowSummary};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

/// Upper bound on pages followed by [`list_all_workflows`].
pub const MAX_PAGES: usize = 100;

/// `workflows/<id>`, with the id kept as a single path segment.
pub fn workflow_request(method: Method, id: &ResourceId) -> ApiRequest {
    ApiRequest::new(method, "workflows").with_segment(id.to_string())
}

/// One page of workflows, exactly as the server filtered it.
pub async fn list_workflows<G: Gateway>(
    gateway: &G,
    query: &WorkflowQuery,
) -> Result<Page<WorkflowSummary>, ApiError> {
    list_workflows_as(gateway, query).await
}

/// [`list_workflows`] decoded into any item type; `Value` keeps each item
/// exactly as the server sent it.
pub async fn list_workflows_as<G: Gateway, T: DeserializeOwned>(
    gateway: &G,
    query: &WorkflowQuery,
) -> Result<Page<T>, ApiError> {
    let value = gateway
        .request(ApiRequest::get("workflows").with_query(query.to_pairs()))
        .await?;
    let page: Page<T> = decode(value)?;
    debug!(
        count = page.data.len(),
        has_more = page.next_cursor.is_some(),
        "Listed workflows"
    );
    Ok(page)
}

/// Follows `nextCursor` until the server stops returning one or
/// `max_pages` pages have been read.
pub async fn list_all_workflows<G: Gateway>(
    gateway: &G,
    query: &WorkflowQuery,
    max_pages: usize,
) -> Result<Vec<WorkflowSummary>, ApiError> {
    list_all_workflows_as(gateway, query, max_pages).await
}

pub async fn list_all_workflows_as<G: Gateway, T: DeserializeOwned>(
    gateway: &G,
    query: &WorkflowQuery,
    max_pages: usize,
) -> Result<Vec<T>, ApiError> {
    let mut query = query.clone();
    let mut all = Vec::new();
    for _ in 0..max_pages {
        let page: Page<T> = list_workflows_as(gateway, &query).await?;
        all.extend(page.data);
        match page.next_cursor.filter(|c| !c.is_empty()) {
            Some(cursor) => query.cursor = Some(cursor),
            None => return Ok(all),
        }
    }
    debug!(max_pages, "Stopped following workflow pages");
    Ok(all)
}

pub async fn get_workflow<G: Gateway>(gateway: &G, id: &ResourceId) -> Result<Workflow, ApiError> {
    get_workflow_as(gateway, id).await
}

pub async fn get_workflow_as<G: Gateway, T: DeserializeOwned>(
    gateway: &G,
    id: &ResourceId,
) -> Result<T, ApiError> {
    let value = gateway.request(workflow_request(Method::Get, id)).await?;
    decode(value)
}

/// Sends `{"active": <active>}` and nothing else. Any 2xx is success; the
/// echoed workflow is returned only when the body holds a full one.
pub async fn set_active<G: Gateway>(
    gateway: &G,
    id: &ResourceId,
    active: bool,
) -> Result<Option<Workflow>, ApiError> {
    let request = workflow_request(Method::Patch, id).with_body(json!({ "active": active }));
    let value = gateway.request(request).await?;
    info!(%id, active, "Workflow active state changed");
    Ok(decode_optional(value))
}

/// The created entity's id is read on its own, so a partial echo still
/// identifies the new workflow.
pub async fn create_workflow<G: Gateway>(
    gateway: &G,
    name: &str,
    active: bool,
) -> Result<Option<ResourceId>, ApiError> {
    let value = gateway
        .request(ApiRequest::post(
            "workflows",
            json!({ "name": name, "active": active }),
        ))
        .await?;
    let id: Option<ResourceId> = value.get("id").cloned().and_then(decode_optional);
    info!(name, id = ?id.as_ref().map(|id| id.to_string()), "Workflow created");
    Ok(id)
}

pub async fn delete_workflow<G: Gateway>(gateway: &G, id: &ResourceId) -> Result<(), ApiError> {
    gateway.request(workflow_request(Method::Delete, id)).await?;
    info!(%id, "Workflow deleted");
    Ok(())
}

/// Writes the whole workflow back. Whatever changed on the server since the
/// workflow was fetched is overwritten.
pub async fn update_workflow<G: Gateway>(
    gateway: &G,
    workflow: &Workflow,
    method: UpdateMethod,
) -> Result<Option<Workflow>, ApiError> {
    let body = serde_json::to_value(workflow)?;
    let request = workflow_request(Method::from(method), &workflow.id).with_body(body);
    let value = gateway.request(request).await?;
    info!(id = %workflow.id, "Workflow updated");
    Ok(decode_optional(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_stubs::StubServer;
    use serde_json::{Value, json};

    fn demo() -> Value {
        json!({
            "id": "1",
            "name": "Demo",
            "active": false,
            "nodes": [{"id": "n1", "name": "Start", "type": "trigger", "parameters": {}}],
            "connections": {}
        })
    }

    fn seeded() -> StubServer {
        StubServer::with_workflows(vec![
            demo(),
            json!({"id": "2", "name": "Billing sync", "active": true, "nodes": []}),
            json!({"id": "3", "name": "Demo backup", "active": true, "nodes": []}),
        ])
    }

    #[tokio::test]
    async fn test_list_with_search_uses_server_filtering() {
        let server = seeded();
        let page = list_workflows(&server, &WorkflowQuery::new(10).with_search("Demo"))
            .await
            .expect("list");

        let calls = server.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::Get);
        assert_eq!(calls[0].endpoint(), "workflows");
        assert_eq!(
            calls[0].query,
            vec![
                ("limit".to_string(), "10".to_string()),
                ("search".to_string(), "Demo".to_string()),
            ]
        );
        let names: Vec<_> = page.data.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Demo", "Demo backup"]);
    }

    #[tokio::test]
    async fn test_list_all_follows_cursor() {
        let server = seeded();
        let all = list_all_workflows(&server, &WorkflowQuery::new(1), MAX_PAGES)
            .await
            .expect("list all");
        assert_eq!(all.len(), 3);
        assert_eq!(server.call_count(), 3);
        assert_eq!(
            server.calls()[2].query.last(),
            Some(&("cursor".to_string(), "2".to_string()))
        );
    }

    #[tokio::test]
    async fn test_list_all_respects_page_cap() {
        let server = seeded();
        let all = list_all_workflows(&server, &WorkflowQuery::new(1), 2)
            .await
            .expect("list all");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_set_active_then_get_reflects_change() {
        let server = seeded();
        let id = ResourceId::from("1");

        let updated = set_active(&server, &id, true).await.expect("activate");
        assert!(updated.expect("workflow in response").active);

        let calls = server.calls();
        assert_eq!(calls[0].method, Method::Patch);
        assert_eq!(calls[0].endpoint(), "workflows/1");
        assert_eq!(calls[0].body, Some(json!({"active": true})));

        let fetched = get_workflow(&server, &id).await.expect("get");
        assert!(fetched.active);
        assert_eq!(fetched.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let server = seeded();
        let created = create_workflow(&server, "Fresh", false)
            .await
            .expect("create")
            .expect("id in response");
        assert_eq!(created, ResourceId::from("4"));
        assert_eq!(
            server.calls()[0].body,
            Some(json!({"name": "Fresh", "active": false}))
        );
        assert_eq!(server.workflow("4").expect("workflow")["name"], "Fresh");

        delete_workflow(&server, &created).await.expect("delete");
        assert!(server.workflow("4").is_none());
    }

    #[tokio::test]
    async fn test_id_with_slash_stays_one_segment() {
        let server = seeded();
        let err = get_workflow(&server, &ResourceId::from("1/activate"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let call = &server.calls()[0];
        assert_eq!(call.path, vec!["workflows".to_string(), "1/activate".to_string()]);
    }

    #[tokio::test]
    async fn test_raw_items_keep_every_field() {
        let server = seeded();
        let page: Page<Value> = list_workflows_as(&server, &WorkflowQuery::new(10))
            .await
            .expect("list");
        assert_eq!(page.data[0], demo());

        let raw: Value = get_workflow_as(&server, &ResourceId::from("1"))
            .await
            .expect("get");
        assert_eq!(raw, demo());
    }

    #[tokio::test]
    async fn test_partial_echo_is_still_success() {
        let server = seeded();
        server.echo_partially();
        let id = ResourceId::from("1");

        let echoed = set_active(&server, &id, true).await.expect("activate");
        assert!(echoed.is_none());
        assert_eq!(server.workflow("1").expect("workflow")["active"], true);

        let created = create_workflow(&server, "Fresh", false)
            .await
            .expect("create");
        assert_eq!(created, Some(ResourceId::from("4")));

        let workflow: Workflow = serde_json::from_value(demo()).expect("parse");
        let updated = update_workflow(&server, &workflow, UpdateMethod::Patch)
            .await
            .expect("update");
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_failure() {
        let server = seeded();
        let err = delete_workflow(&server, &ResourceId::from("404"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_mutation_changes_nothing() {
        let server = seeded();
        server.fail_next(500, "database is locked");
        let err = set_active(&server, &ResourceId::from("1"), true)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(server.workflow("1").expect("workflow")["active"], false);
    }

    #[tokio::test]
    async fn test_update_uses_configured_method() {
        let server = seeded();
        let mut workflow = get_workflow(&server, &ResourceId::from("1"))
            .await
            .expect("get");
        workflow.name = "Renamed".to_string();

        update_workflow(&server, &workflow, UpdateMethod::Put)
            .await
            .expect("update");
        let last = server.calls().pop().expect("call");
        assert_eq!(last.method, Method::Put);
        assert_eq!(last.body.expect("body")["connections"], json!({}));
        assert_eq!(server.workflow("1").expect("workflow")["name"], "Renamed");
    }
}

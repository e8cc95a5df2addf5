//! In-memory stand-in for the workflow server.
//!
//! [`StubServer`] answers the same endpoints the real API does, keeps the
//! workflows it was seeded with in memory and records every request, so
//! operations and sessions can be exercised end to end without a network.

use crate::{ApiError, ApiRequest, Gateway, Method};
use serde_json::{Map, Value, json};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    workflows: Vec<Value>,
    executions: Vec<Value>,
    next_id: u64,
    failures: Vec<(u16, String)>,
    partial_echo: bool,
}

#[derive(Default)]
pub struct StubServer {
    state: Mutex<State>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl StubServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workflows(workflows: Vec<Value>) -> Self {
        let server = Self::new();
        {
            let mut state = server.state.lock().unwrap();
            state.next_id = workflows.len() as u64 + 1;
            state.workflows = workflows;
        }
        server
    }

    pub fn add_execution(&self, execution: Value) {
        self.state.lock().unwrap().executions.push(execution);
    }

    /// The next request fails with `status` before touching any state.
    pub fn fail_next(&self, status: u16, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((status, message.into()));
    }

    /// From now on, successful mutations answer with only `id` and `active`
    /// instead of the whole entity.
    pub fn echo_partially(&self) {
        self.state.lock().unwrap().partial_echo = true;
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn mutating_calls(&self) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.method != Method::Get)
            .collect()
    }

    pub fn workflow(&self, id: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        find(&state.workflows, id).map(|i| state.workflows[i].clone())
    }

    fn handle(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let mut state = self.state.lock().unwrap();
        if !state.failures.is_empty() {
            let (status, message) = state.failures.remove(0);
            return Err(ApiError::Status { status, message });
        }

        let segments: Vec<&str> = request.segments().collect();
        match (request.method, segments.as_slice()) {
            (Method::Get, ["workflows"]) => Ok(list_workflows(&state.workflows, &request.query)),
            (Method::Post, ["workflows"]) => {
                let body = request.body.clone().unwrap_or_else(|| json!({}));
                let id = state.next_id.to_string();
                state.next_id += 1;
                let mut workflow = json!({
                    "id": id,
                    "name": body.get("name").cloned().unwrap_or(Value::Null),
                    "active": body.get("active").cloned().unwrap_or(Value::Bool(false)),
                    "nodes": [],
                    "connections": {}
                });
                merge(&mut workflow, &body);
                state.workflows.push(workflow.clone());
                Ok(workflow)
            }
            (Method::Get, ["workflows", id]) => find(&state.workflows, id)
                .map(|i| state.workflows[i].clone())
                .ok_or_else(not_found),
            (Method::Patch, ["workflows", id]) => {
                let i = find(&state.workflows, id).ok_or_else(not_found)?;
                if let Some(body) = &request.body {
                    merge(&mut state.workflows[i], body);
                }
                Ok(state.workflows[i].clone())
            }
            (Method::Put, ["workflows", id]) => {
                let i = find(&state.workflows, id).ok_or_else(not_found)?;
                let body = request.body.clone().unwrap_or_else(|| json!({}));
                state.workflows[i] = body;
                Ok(state.workflows[i].clone())
            }
            (Method::Delete, ["workflows", id]) => {
                let i = find(&state.workflows, id).ok_or_else(not_found)?;
                Ok(state.workflows.remove(i))
            }
            (Method::Get, ["executions"]) => {
                Ok(list_executions(&state.executions, &request.query))
            }
            _ => Err(ApiError::Status {
                status: 404,
                message: format!("No route for {} {}", request.method, request.endpoint()),
            }),
        }
    }
}

impl Gateway for StubServer {
    async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(request.clone());
        let value = self.handle(&request)?;
        if request.method != Method::Get && self.state.lock().unwrap().partial_echo {
            return Ok(json!({"id": value.get("id"), "active": value.get("active")}));
        }
        Ok(value)
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        message: "Not Found".to_string(),
    }
}

fn id_of(value: &Value) -> String {
    match value.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn find(items: &[Value], id: &str) -> Option<usize> {
    items.iter().position(|w| id_of(w) == id)
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(patch)) = (target, patch) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
}

fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn limit(query: &[(String, String)]) -> usize {
    query_value(query, "limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(100)
}

/// Cursor is the offset of the next page, rendered as a string.
fn paginate(items: Vec<Value>, query: &[(String, String)]) -> Value {
    let offset: usize = query_value(query, "cursor")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let limit = limit(query);
    let total = items.len();
    let data: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();
    let mut page = Map::new();
    page.insert("data".to_string(), Value::Array(data));
    if offset + limit < total {
        page.insert(
            "nextCursor".to_string(),
            Value::String((offset + limit).to_string()),
        );
    }
    Value::Object(page)
}

fn list_workflows(workflows: &[Value], query: &[(String, String)]) -> Value {
    let search = query_value(query, "search").map(str::to_lowercase);
    let active = query_value(query, "active").and_then(|v| v.parse::<bool>().ok());
    let matching = workflows
        .iter()
        .filter(|w| match &search {
            Some(term) => w
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|n| n.to_lowercase().contains(term)),
            None => true,
        })
        .filter(|w| match active {
            Some(flag) => w.get("active").and_then(Value::as_bool) == Some(flag),
            None => true,
        })
        .cloned()
        .collect();
    paginate(matching, query)
}

fn list_executions(executions: &[Value], query: &[(String, String)]) -> Value {
    let workflow_id = query_value(query, "workflowId");
    let status = query_value(query, "status");
    let matching = executions
        .iter()
        .filter(|e| match workflow_id {
            Some(id) => e.get("workflowId").map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }) == Some(id.to_string()),
            None => true,
        })
        .filter(|e| match status {
            Some(s) => e.get("status").and_then(Value::as_str) == Some(s),
            None => true,
        })
        .cloned()
        .collect();
    paginate(matching, query)
}

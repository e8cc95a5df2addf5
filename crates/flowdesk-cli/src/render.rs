//! Plain-text rendering. Positions shown to the operator are 1-based.

use chrono::{DateTime, Utc};
use flowdesk_core::session::Notice;
use flowdesk_core::{Execution, Node, Workflow, WorkflowSummary, render_parameters};

fn active_label(active: bool) -> &'static str {
    if active { "active" } else { "inactive" }
}

fn timestamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}\n", prefix, line))
        .collect()
}

pub fn workflow_list(
    workflows: &[WorkflowSummary],
    selected: Option<usize>,
    next_cursor: Option<&str>,
) -> String {
    if workflows.is_empty() {
        return "No workflows found\n".to_string();
    }
    let mut out = String::new();
    for (i, workflow) in workflows.iter().enumerate() {
        let marker = if selected == Some(i) { '*' } else { ' ' };
        out.push_str(&format!(
            "{}{:>3}. {} [{}] (id {})\n",
            marker,
            i + 1,
            workflow.name,
            active_label(workflow.active),
            workflow.id
        ));
    }
    if let Some(cursor) = next_cursor {
        out.push_str(&format!("More workflows available (cursor {})\n", cursor));
    }
    out
}

pub fn workflow_detail(workflow: &Workflow) -> String {
    format!(
        "Workflow: {}\nID: {}\nStatus: {}\nNodes: {}\n",
        workflow.name,
        workflow.id,
        active_label(workflow.active),
        workflow.nodes.len()
    )
}

pub fn node(position: usize, node: &Node) -> String {
    let mut out = format!("[{}] {} ({})\n", position, node.name, node.node_type);
    let id = node
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    out.push_str(&format!("    id: {}\n", id));
    out.push_str("    parameters:\n");
    out.push_str(&indent(&render_parameters(node), "      "));
    match &node.credentials {
        Some(credentials) if !credentials.is_empty() => {
            let text = serde_json::to_string_pretty(credentials)
                .unwrap_or_else(|_| "{}".to_string());
            out.push_str("    credentials:\n");
            out.push_str(&indent(&text, "      "));
        }
        _ => out.push_str("    credentials: none\n"),
    }
    out
}

pub fn node_list(nodes: &[Node]) -> String {
    if nodes.is_empty() {
        return "Workflow has no nodes\n".to_string();
    }
    nodes
        .iter()
        .enumerate()
        .map(|(i, n)| node(i + 1, n))
        .collect()
}

pub fn execution_list(executions: &[Execution]) -> String {
    if executions.is_empty() {
        return "No executions found\n".to_string();
    }
    let mut out = String::new();
    for execution in executions {
        out.push_str(&format!(
            "{:<10} {:<9} started {}  stopped {}",
            execution.id.to_string(),
            execution.status.as_ref().map_or("-", |s| s.as_str()),
            timestamp(execution.started_at.as_ref()),
            timestamp(execution.stopped_at.as_ref()),
        ));
        if let Some(message) = execution.error.as_ref().and_then(|e| e.message.as_deref()) {
            out.push_str(&format!("  error: {}", message));
        }
        out.push('\n');
    }
    out
}

pub fn notice(notice: &Notice) -> String {
    match notice {
        Notice::Info(message) => format!("{}\n", message),
        Notice::Success(message) => format!("ok: {}\n", message),
        Notice::Error(message) => format!("error: {}\n", message),
    }
}

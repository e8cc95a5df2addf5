use super::{parse_id, print_json};
use crate::config::Settings;
use crate::render;
use anyhow::{Context, Result};
use clap::Subcommand;
use flowdesk_api::Gateway;
use flowdesk_api::workflows::{
    MAX_PAGES, create_workflow, delete_workflow, get_workflow, get_workflow_as,
    list_all_workflows, list_all_workflows_as, list_workflows, list_workflows_as, set_active,
};
use flowdesk_core::{Page, ResourceId, WorkflowQuery};
use serde_json::Value;
use std::io::Write;

#[derive(Debug, Subcommand)]
pub enum WorkflowsCommand {
    /// List workflows as the server filters them
    List {
        /// Only workflows whose name matches
        #[arg(long)]
        search: Option<String>,

        /// Only active workflows
        #[arg(long, conflicts_with = "inactive")]
        active: bool,

        /// Only inactive workflows
        #[arg(long)]
        inactive: bool,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,

        /// Continue from a previous page
        #[arg(long, conflicts_with = "all")]
        cursor: Option<String>,

        /// Follow pages until the server has no more
        #[arg(long)]
        all: bool,
    },
    /// Show one workflow
    Show { id: String },
    /// Activate a workflow
    Activate { id: String },
    /// Deactivate a workflow
    Deactivate { id: String },
    /// Create an empty workflow
    Create {
        name: String,

        #[arg(long)]
        active: bool,
    },
    /// Delete a workflow
    Delete { id: String },
}

pub async fn run<G: Gateway>(
    gateway: &G,
    settings: &Settings,
    command: WorkflowsCommand,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        WorkflowsCommand::List {
            search,
            active,
            inactive,
            limit,
            cursor,
            all,
        } => {
            let mut query = WorkflowQuery::new(limit.unwrap_or(settings.list_limit));
            query.search = search;
            query.cursor = cursor;
            query.active = match (active, inactive) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };

            if json {
                let page: Page<Value> = if all {
                    Page::single(
                        list_all_workflows_as(gateway, &query, MAX_PAGES)
                            .await
                            .context("Error fetching workflows")?,
                    )
                } else {
                    list_workflows_as(gateway, &query)
                        .await
                        .context("Error fetching workflows")?
                };
                return print_json(out, &page);
            }

            let page = if all {
                Page::single(
                    list_all_workflows(gateway, &query, MAX_PAGES)
                        .await
                        .context("Error fetching workflows")?,
                )
            } else {
                list_workflows(gateway, &query)
                    .await
                    .context("Error fetching workflows")?
            };
            write!(
                out,
                "{}",
                render::workflow_list(&page.data, None, page.next_cursor.as_deref())
            )?;
        }
        WorkflowsCommand::Show { id } => {
            show(gateway, &parse_id(&id), None, json, out).await?;
        }
        WorkflowsCommand::Activate { id } => {
            toggle(gateway, &id, true, json, out).await?;
        }
        WorkflowsCommand::Deactivate { id } => {
            toggle(gateway, &id, false, json, out).await?;
        }
        WorkflowsCommand::Create { name, active } => {
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("Workflow name is empty");
            }
            let created = create_workflow(gateway, name, active)
                .await
                .context("Error creating workflow")?;
            let heading = format!("Workflow '{}' created", name);
            match created {
                Some(id) => show(gateway, &id, Some(&heading), json, out).await?,
                None => writeln!(out, "{}", heading)?,
            }
        }
        WorkflowsCommand::Delete { id } => {
            let id = parse_id(&id);
            delete_workflow(gateway, &id)
                .await
                .with_context(|| format!("Error deleting workflow {}", id))?;
            writeln!(out, "Workflow {} deleted", id)?;
        }
    }
    Ok(())
}

/// Changes the flag, then shows the workflow as the server now has it.
async fn toggle<G: Gateway>(
    gateway: &G,
    id: &str,
    active: bool,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let id = parse_id(id);
    set_active(gateway, &id, active)
        .await
        .with_context(|| format!("Error changing active state of workflow {}", id))?;
    let heading = if active {
        "Workflow activated"
    } else {
        "Workflow deactivated"
    };
    show(gateway, &id, Some(heading), json, out).await
}

/// Fetches the workflow and prints it; with `json` the body is printed as the
/// server sent it.
async fn show<G: Gateway>(
    gateway: &G,
    id: &ResourceId,
    heading: Option<&str>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let context = || format!("Error fetching workflow {}", id);
    if json {
        let raw: Value = get_workflow_as(gateway, id).await.with_context(context)?;
        return print_json(out, &raw);
    }
    let workflow = get_workflow(gateway, id).await.with_context(context)?;
    if let Some(heading) = heading {
        writeln!(out, "{}", heading)?;
    }
    write!(out, "{}", render::workflow_detail(&workflow))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionArgs, FileConfig};
    use flowdesk_api::Method;
    use flowdesk_api::test_stubs::StubServer;
    use serde_json::{Value, json};

    fn settings() -> Settings {
        Settings::resolve(&ConnectionArgs::default(), FileConfig::default())
    }

    fn server() -> StubServer {
        StubServer::with_workflows(vec![
            json!({"id": "1", "name": "Demo", "active": false, "nodes": [], "connections": {}}),
            json!({"id": "2", "name": "Demo backup", "active": true, "nodes": []}),
            json!({"id": "3", "name": "Billing", "active": true, "nodes": []}),
        ])
    }

    async fn run_text(server: &StubServer, command: WorkflowsCommand) -> Result<String> {
        let mut out = Vec::new();
        run(server, &settings(), command, false, &mut out).await?;
        Ok(String::from_utf8(out).expect("utf8"))
    }

    fn list(search: Option<&str>) -> WorkflowsCommand {
        WorkflowsCommand::List {
            search: search.map(str::to_string),
            active: false,
            inactive: false,
            limit: Some(10),
            cursor: None,
            all: false,
        }
    }

    #[tokio::test]
    async fn test_list_with_search() {
        let server = server();
        let text = run_text(&server, list(Some("Demo"))).await.expect("list");
        assert_eq!(
            text,
            "   1. Demo [inactive] (id 1)\n   2. Demo backup [active] (id 2)\n"
        );
        assert_eq!(
            server.calls()[0].query,
            vec![
                ("limit".to_string(), "10".to_string()),
                ("search".to_string(), "Demo".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_all_as_json() {
        let server = server();
        let mut out = Vec::new();
        let command = WorkflowsCommand::List {
            search: None,
            active: true,
            inactive: false,
            limit: Some(1),
            cursor: None,
            all: true,
        };
        run(&server, &settings(), command, true, &mut out)
            .await
            .expect("list");
        let page: Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(page["data"].as_array().map(Vec::len), Some(2));
        assert!(page.get("nextCursor").is_none());
        assert!(
            server.calls()[0]
                .query
                .contains(&("active".to_string(), "true".to_string()))
        );
    }

    #[tokio::test]
    async fn test_show_json_is_server_body() {
        let server = StubServer::with_workflows(vec![json!({
            "id": "1",
            "name": "Demo",
            "nodes": [],
            "tags": [{"id": "t1", "name": "ops"}]
        })]);
        let mut out = Vec::new();
        run(
            &server,
            &settings(),
            WorkflowsCommand::Show {
                id: "1".to_string(),
            },
            true,
            &mut out,
        )
        .await
        .expect("show");
        let printed: Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(printed, server.workflow("1").expect("workflow"));
        assert!(printed.get("active").is_none());
    }

    #[tokio::test]
    async fn test_activate_refetches() {
        let server = server();
        let text = run_text(
            &server,
            WorkflowsCommand::Activate {
                id: "1".to_string(),
            },
        )
        .await
        .expect("activate");
        assert!(text.starts_with("Workflow activated\n"));
        assert!(text.contains("Status: active\n"));

        let calls = server.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, Method::Patch);
        assert_eq!(calls[0].body, Some(json!({"active": true})));
        assert_eq!(calls[1].method, Method::Get);
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let server = server();
        let text = run_text(
            &server,
            WorkflowsCommand::Create {
                name: "Fresh".to_string(),
                active: false,
            },
        )
        .await
        .expect("create");
        assert!(text.starts_with("Workflow 'Fresh' created\n"));

        let text = run_text(
            &server,
            WorkflowsCommand::Delete {
                id: "4".to_string(),
            },
        )
        .await
        .expect("delete");
        assert_eq!(text, "Workflow 4 deleted\n");
        assert!(server.workflow("4").is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_fails() {
        let server = server();
        let err = run_text(
            &server,
            WorkflowsCommand::Delete {
                id: "99".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Error deleting workflow 99");
        assert!(format!("{:#}", err).contains("API error (404)"));
    }

    #[tokio::test]
    async fn test_failed_activation_reports_and_skips_refetch() {
        let server = server();
        server.fail_next(401, "unauthorized");
        let err = run_text(
            &server,
            WorkflowsCommand::Activate {
                id: "1".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(format!("{:#}", err).contains("unauthorized"));
        assert_eq!(server.call_count(), 1);
    }
}

use super::{parse_id, print_json};
use crate::config::Settings;
use crate::render;
use anyhow::{Context, Result};
use clap::Subcommand;
use flowdesk_api::Gateway;
use flowdesk_api::executions::{list_executions, list_executions_as};
use flowdesk_core::{ExecutionQuery, ExecutionStatus, Page};
use serde_json::Value;
use std::io::Write;

#[derive(Debug, Subcommand)]
pub enum ExecutionsCommand {
    /// Recent executions, newest first
    List {
        /// Only executions of this workflow
        #[arg(long)]
        workflow: Option<String>,

        /// Only executions with this status (success, error, running, ...)
        #[arg(long)]
        status: Option<ExecutionStatus>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        cursor: Option<String>,
    },
}

pub async fn run<G: Gateway>(
    gateway: &G,
    settings: &Settings,
    command: ExecutionsCommand,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        ExecutionsCommand::List {
            workflow,
            status,
            limit,
            cursor,
        } => {
            let query = ExecutionQuery {
                workflow_id: workflow.as_deref().map(parse_id),
                limit: limit.unwrap_or(settings.execution_limit),
                status,
                cursor,
            };
            if json {
                let page: Page<Value> = list_executions_as(gateway, &query)
                    .await
                    .context("Error fetching executions")?;
                return print_json(out, &page);
            }
            let page = list_executions(gateway, &query)
                .await
                .context("Error fetching executions")?;
            write!(out, "{}", render::execution_list(&page.data))?;
            if let Some(cursor) = &page.next_cursor {
                writeln!(out, "More executions available (cursor {})", cursor)?;
            }
        }
    }
    Ok(())
}

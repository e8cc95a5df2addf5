use super::{parse_id, print_json};
use crate::config::Settings;
use crate::render;
use anyhow::{Context, Result};
use clap::Subcommand;
use flowdesk_api::Gateway;
use flowdesk_api::nodes::{edit_node, load_nodes};
use flowdesk_api::workflows::{get_workflow, get_workflow_as};
use flowdesk_core::{NodeEdit, ResourceId, Workflow};
use serde_json::Value;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Subcommand)]
pub enum NodesCommand {
    /// Show every node with its parameters and credentials
    List { workflow_id: String },
    /// Change one node and write the whole workflow back
    Edit {
        workflow_id: String,

        /// Node position as listed, starting at 1
        position: usize,

        /// New node name
        #[arg(long)]
        name: Option<String>,

        /// New node type
        #[arg(long = "type")]
        node_type: Option<String>,

        /// New parameters as JSON text
        #[arg(long, conflicts_with = "parameters_file")]
        parameters: Option<String>,

        /// Read the new parameters from a file, `-` for stdin
        #[arg(long)]
        parameters_file: Option<PathBuf>,
    },
}

pub async fn run<G: Gateway>(
    gateway: &G,
    settings: &Settings,
    command: NodesCommand,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        NodesCommand::List { workflow_id } => {
            let id = parse_id(&workflow_id);
            if json {
                let raw = fetch_raw(gateway, &id).await?;
                let nodes = raw
                    .get("nodes")
                    .cloned()
                    .unwrap_or_else(|| Value::Array(Vec::new()));
                print_json(out, &nodes)?;
            } else {
                let workflow = fetch(gateway, &id).await?;
                write!(out, "{}", render::workflow_detail(&workflow))?;
                write!(out, "{}", render::node_list(load_nodes(&workflow)))?;
            }
        }
        NodesCommand::Edit {
            workflow_id,
            position,
            name,
            node_type,
            parameters,
            parameters_file,
        } => {
            let parameters = match (parameters, parameters_file) {
                (Some(text), _) => Some(text),
                (None, Some(path)) => Some(read_parameters(&path)?),
                (None, None) => None,
            };
            let id = parse_id(&workflow_id);
            let workflow = fetch(gateway, &id).await?;
            let edit = build_edit(&workflow, position, name, node_type, parameters)?;

            edit_node(gateway, &workflow, &edit, settings.update_method)
                .await
                .context("Error updating node")?;

            let gone = || format!("Node {} is gone after the update", position);
            if json {
                let raw = fetch_raw(gateway, &id).await?;
                let node = raw
                    .get("nodes")
                    .and_then(|nodes| nodes.get(edit.index))
                    .with_context(gone)?;
                print_json(out, node)?;
            } else {
                let reloaded = fetch(gateway, &id).await?;
                let node = reloaded.node(edit.index).with_context(gone)?;
                writeln!(out, "Node updated successfully")?;
                write!(out, "{}", render::node(position, node))?;
            }
        }
    }
    Ok(())
}

async fn fetch<G: Gateway>(gateway: &G, id: &ResourceId) -> Result<Workflow> {
    get_workflow(gateway, id)
        .await
        .with_context(|| format!("Error fetching workflow {}", id))
}

async fn fetch_raw<G: Gateway>(gateway: &G, id: &ResourceId) -> Result<Value> {
    get_workflow_as(gateway, id)
        .await
        .with_context(|| format!("Error fetching workflow {}", id))
}

fn read_parameters(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read parameters from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameters: {}", path.display()))
}

/// Starts from the node's current values and overrides what was given.
pub(crate) fn build_edit(
    workflow: &Workflow,
    position: usize,
    name: Option<String>,
    node_type: Option<String>,
    parameters: Option<String>,
) -> Result<NodeEdit> {
    let index = position
        .checked_sub(1)
        .context("Node positions start at 1")?;
    let node = workflow.node(index).with_context(|| {
        format!(
            "No node at position {} (workflow has {} nodes)",
            position,
            workflow.nodes.len()
        )
    })?;
    let mut edit = NodeEdit::from_node(index, node);
    if let Some(name) = name {
        edit.name = name;
    }
    if let Some(node_type) = node_type {
        edit.node_type = node_type;
    }
    if let Some(parameters) = parameters {
        edit.parameters = parameters;
    }
    Ok(edit)
}

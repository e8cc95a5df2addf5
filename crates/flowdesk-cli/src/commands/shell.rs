//! Interactive editor session.
//!
//! Every line the operator types becomes a session event; the dashboard
//! performs the resulting calls and the shell prints what the session now
//! holds. Failures are printed and the shell keeps running.

use super::nodes::build_edit;
use crate::config::Settings;
use crate::render;
use anyhow::Result;
use flowdesk_api::{Dashboard, Gateway};
use flowdesk_core::session::{Event, Session};
use flowdesk_core::{NodeEdit, WorkflowQuery};
use std::io::{BufRead, Write};
use tracing::info;

const HELP: &str = "\
Commands:
  list [search]     list workflows, optionally filtered by name
  select <n>        select the workflow at position n
  show              show the selected workflow
  nodes             show the selected workflow's nodes
  edit <n>          edit node n of the selected workflow
  activate          activate the selected workflow
  deactivate        deactivate the selected workflow
  create <name>     create an empty workflow
  delete            delete the selected workflow
  executions        recent executions of the selected workflow
  refresh           re-read everything from the server
  help              this text
  quit              leave the shell
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List(Option<String>),
    Select(usize),
    Show,
    Nodes,
    Edit(usize),
    Activate,
    Deactivate,
    Create(String),
    Delete,
    Executions,
    Refresh,
    Help,
    Quit,
}

/// `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => ShellCommand::List((!rest.is_empty()).then(|| rest.to_string())),
        "select" | "use" => ShellCommand::Select(position(rest)?),
        "show" => ShellCommand::Show,
        "nodes" => ShellCommand::Nodes,
        "edit" => ShellCommand::Edit(position(rest)?),
        "activate" => ShellCommand::Activate,
        "deactivate" => ShellCommand::Deactivate,
        "create" => {
            if rest.is_empty() {
                return Err("usage: create <name>".to_string());
            }
            ShellCommand::Create(rest.to_string())
        }
        "delete" => ShellCommand::Delete,
        "executions" | "runs" => ShellCommand::Executions,
        "refresh" => ShellCommand::Refresh,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{}', type 'help'", other)),
    };
    Ok(Some(command))
}

fn position(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("expected a position starting at 1, got '{}'", arg)),
    }
}

pub struct Shell<G: Gateway, R, W> {
    dashboard: Dashboard<G>,
    input: R,
    output: W,
}

impl<G: Gateway, R: BufRead, W: Write> Shell<G, R, W> {
    pub fn new(dashboard: Dashboard<G>, input: R, output: W) -> Self {
        Self {
            dashboard,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session {
        self.dashboard.session()
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs until `quit` or end of input.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Type 'help' for commands.")?;
        self.dispatch(Event::Refresh).await?;
        self.print_list()?;

        loop {
            write!(self.output, "flowdesk> ")?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else {
                break;
            };
            match parse_command(&line) {
                Ok(Some(command)) => {
                    if !self.execute(command).await? {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => writeln!(self.output, "error: {}", message)?,
            }
        }
        info!("Shell closed");
        Ok(())
    }

    /// Returns `false` when the shell should stop.
    async fn execute(&mut self, command: ShellCommand) -> Result<bool> {
        match command {
            ShellCommand::List(search) => {
                self.dispatch(Event::Search(search)).await?;
                self.print_list()?;
            }
            ShellCommand::Select(position) => {
                self.dispatch(Event::Select(position - 1)).await?;
                self.print_detail()?;
            }
            ShellCommand::Show => self.print_detail()?,
            ShellCommand::Nodes => match self.session().detail() {
                Some(detail) => {
                    let text = render::node_list(&detail.nodes);
                    write!(self.output, "{}", text)?;
                }
                None => self.print_no_detail()?,
            },
            ShellCommand::Edit(position) => self.edit(position).await?,
            ShellCommand::Activate => {
                self.dispatch(Event::SetActive(true)).await?;
                self.print_detail()?;
            }
            ShellCommand::Deactivate => {
                self.dispatch(Event::SetActive(false)).await?;
                self.print_detail()?;
            }
            ShellCommand::Create(name) => {
                self.dispatch(Event::CreateWorkflow {
                    name,
                    active: false,
                })
                .await?;
                self.print_list()?;
            }
            ShellCommand::Delete => self.delete().await?,
            ShellCommand::Executions => {
                if self.session().selected_id().is_none() {
                    self.print_no_detail()?;
                } else {
                    let text = render::execution_list(self.session().executions());
                    write!(self.output, "{}", text)?;
                }
            }
            ShellCommand::Refresh => {
                self.dispatch(Event::Refresh).await?;
                self.print_list()?;
            }
            ShellCommand::Help => write!(self.output, "{}", HELP)?,
            ShellCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Prints the resulting notice. Returns `false` if it was an error.
    async fn dispatch(&mut self, event: Event) -> Result<bool> {
        self.dashboard.dispatch(event).await;
        match self.dashboard.session_mut().take_notice() {
            Some(notice) => {
                write!(self.output, "{}", render::notice(&notice))?;
                Ok(!notice.is_error())
            }
            None => Ok(true),
        }
    }

    async fn edit(&mut self, position: usize) -> Result<()> {
        let Some(detail) = self.session().detail() else {
            return self.print_no_detail();
        };
        // Prefill from the detail as loaded; the session re-validates on submit.
        let edit = match build_edit(detail, position, None, None, None) {
            Ok(edit) => edit,
            Err(e) => {
                writeln!(self.output, "error: {}", e)?;
                return Ok(());
            }
        };
        let Some(edit) = self.prompt_edit(edit)? else {
            writeln!(self.output, "Edit cancelled")?;
            return Ok(());
        };

        if !self.dispatch(Event::EditNode(edit)).await? {
            return Ok(());
        }
        if let Some(node) = self.session().detail().and_then(|d| d.node(position - 1)) {
            let text = render::node(position, node);
            write!(self.output, "{}", text)?;
        }
        Ok(())
    }

    /// Asks for name, type and parameters. `None` when input ends early.
    fn prompt_edit(&mut self, mut edit: NodeEdit) -> Result<Option<NodeEdit>> {
        writeln!(
            self.output,
            "Editing node {} ({}). Press Enter to keep a value.",
            edit.index + 1,
            edit.name
        )?;

        write!(self.output, "Name [{}]: ", edit.name)?;
        self.output.flush()?;
        let Some(name) = self.read_line()? else {
            return Ok(None);
        };
        if !name.trim().is_empty() {
            edit.name = name.trim().to_string();
        }

        write!(self.output, "Type [{}]: ", edit.node_type)?;
        self.output.flush()?;
        let Some(node_type) = self.read_line()? else {
            return Ok(None);
        };
        if !node_type.trim().is_empty() {
            edit.node_type = node_type.trim().to_string();
        }

        writeln!(self.output, "Current parameters:\n{}", edit.parameters)?;
        writeln!(
            self.output,
            "Enter new parameters as JSON and finish with a line containing only '.'; \
             a lone '.' keeps them."
        )?;
        let mut lines = Vec::new();
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.trim() == "." {
                break;
            }
            lines.push(line);
        }
        if !lines.is_empty() {
            edit.parameters = lines.join("\n");
        }
        Ok(Some(edit))
    }

    async fn delete(&mut self) -> Result<()> {
        let Some(name) = self.session().detail().map(|d| d.name.clone()) else {
            // Without a loaded detail the session reports the missing selection.
            self.dispatch(Event::DeleteSelected).await?;
            return Ok(());
        };
        write!(self.output, "Delete workflow '{}'? [y/N] ", name)?;
        self.output.flush()?;
        let answer = self.read_line()?.unwrap_or_default();
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            writeln!(self.output, "Not deleted")?;
            return Ok(());
        }
        if self.dispatch(Event::DeleteSelected).await? {
            self.print_list()?;
        }
        Ok(())
    }

    fn print_list(&mut self) -> Result<()> {
        let session = self.dashboard.session();
        if session.workflows().is_empty() {
            return Ok(());
        }
        let text = render::workflow_list(
            session.workflows(),
            session.selected_index(),
            session.next_cursor(),
        );
        write!(self.output, "{}", text)?;
        Ok(())
    }

    fn print_detail(&mut self) -> Result<()> {
        match self.dashboard.session().detail() {
            Some(detail) => {
                let text = render::workflow_detail(detail);
                write!(self.output, "{}", text)?;
                Ok(())
            }
            None => self.print_no_detail(),
        }
    }

    fn print_no_detail(&mut self) -> Result<()> {
        if self.session().selected_id().is_some() {
            writeln!(self.output, "Workflow not loaded; try 'refresh'")?;
        } else {
            writeln!(self.output, "No workflow selected")?;
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(|c| c == '\r' || c == '\n').to_string()))
    }
}

/// Shell on stdin/stdout against `gateway`.
pub async fn run_interactive<G: Gateway>(gateway: G, settings: &Settings) -> Result<()> {
    let session = Session::new(
        WorkflowQuery::new(settings.list_limit),
        settings.execution_limit,
    );
    let dashboard = Dashboard::new(gateway, session, settings.update_method);
    let stdin = std::io::stdin();
    let mut shell = Shell::new(dashboard, stdin.lock(), std::io::stdout());
    shell.run().await
}

//! Editor session state.
//!
//! A [`Session`] holds what the operator is looking at: the list query, the
//! last fetched list, the selection, the loaded workflow and its executions.
//! It never talks to the server. [`Session::handle`] takes an [`Event`]
//! (operator input or a fetch/mutation result), updates the state and
//! returns the [`Action`]s that must be performed next. Whoever drives the
//! session performs each action and feeds the outcome back as another event.

use crate::{
    DEFAULT_EXECUTION_LIMIT, Execution, ExecutionQuery, NodeEdit, Page, ResourceId, Workflow,
    WorkflowQuery, WorkflowSummary, apply_node_edit,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(m) | Notice::Success(m) | Notice::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Where the session is in the list → select → detail flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No list has been fetched yet.
    NotLoaded,
    /// The server returned no workflows for the current query.
    Empty,
    /// A list is shown, nothing is selected.
    SelectionPending,
    /// A workflow is selected but its detail has not arrived.
    Selected,
    /// The selected workflow is loaded; nodes can be edited.
    DetailLoaded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Re-read the list (and, through it, the selection) from the server.
    Refresh,
    Search(Option<String>),
    FilterActive(Option<bool>),
    Select(usize),
    ClearSelection,
    SetActive(bool),
    CreateWorkflow { name: String, active: bool },
    DeleteSelected,
    EditNode(NodeEdit),

    ListLoaded(Page<WorkflowSummary>),
    WorkflowLoaded(Workflow),
    /// `workflow_id` is the filter the page was fetched with.
    ExecutionsLoaded {
        workflow_id: Option<ResourceId>,
        page: Page<Execution>,
    },
    Mutated(Mutation),
    Failed { action: ActionKind, message: String },
}

/// An outbound call the session needs performed.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    FetchList(WorkflowQuery),
    FetchWorkflow(ResourceId),
    FetchExecutions(ExecutionQuery),
    SetActive { id: ResourceId, active: bool },
    CreateWorkflow { name: String, active: bool },
    DeleteWorkflow(ResourceId),
    /// Full-object write-back of an edited workflow.
    UpdateWorkflow(Box<Workflow>),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::FetchList(_) => ActionKind::FetchList,
            Action::FetchWorkflow(_) => ActionKind::FetchWorkflow,
            Action::FetchExecutions(_) => ActionKind::FetchExecutions,
            Action::SetActive { .. } => ActionKind::SetActive,
            Action::CreateWorkflow { .. } => ActionKind::CreateWorkflow,
            Action::DeleteWorkflow(_) => ActionKind::DeleteWorkflow,
            Action::UpdateWorkflow(_) => ActionKind::UpdateWorkflow,
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    FetchList,
    FetchWorkflow,
    FetchExecutions,
    SetActive,
    CreateWorkflow,
    DeleteWorkflow,
    UpdateWorkflow,
}

impl ActionKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ActionKind::FetchList => "Error fetching workflows",
            ActionKind::FetchWorkflow => "Error fetching workflow",
            ActionKind::FetchExecutions => "Error fetching executions",
            ActionKind::SetActive => "Error changing active state",
            ActionKind::CreateWorkflow => "Error creating workflow",
            ActionKind::DeleteWorkflow => "Error deleting workflow",
            ActionKind::UpdateWorkflow => "Error updating node",
        }
    }
}

/// A mutation the server acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    ActiveChanged { id: ResourceId, active: bool },
    /// `id` is `None` when the server acknowledged without returning the entity.
    Created { name: String, id: Option<ResourceId> },
    Deleted(ResourceId),
    Updated(ResourceId),
}

#[derive(Debug, Clone)]
pub struct Session {
    query: WorkflowQuery,
    execution_limit: u32,
    loaded: bool,
    workflows: Vec<WorkflowSummary>,
    next_cursor: Option<String>,
    selected: Option<usize>,
    selected_id: Option<ResourceId>,
    detail: Option<Workflow>,
    executions: Vec<Execution>,
    notice: Option<Notice>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(WorkflowQuery::default(), DEFAULT_EXECUTION_LIMIT)
    }
}

impl Session {
    pub fn new(query: WorkflowQuery, execution_limit: u32) -> Self {
        Self {
            query,
            execution_limit,
            loaded: false,
            workflows: Vec::new(),
            next_cursor: None,
            selected: None,
            selected_id: None,
            detail: None,
            executions: Vec::new(),
            notice: None,
        }
    }

    pub fn query(&self) -> &WorkflowQuery {
        &self.query
    }

    pub fn workflows(&self) -> &[WorkflowSummary] {
        &self.workflows
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_id(&self) -> Option<&ResourceId> {
        self.selected_id.as_ref()
    }

    /// The loaded workflow. Only ever `Some` while a selection exists.
    pub fn detail(&self) -> Option<&Workflow> {
        self.detail.as_ref()
    }

    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn phase(&self) -> Phase {
        if !self.loaded {
            Phase::NotLoaded
        } else if self.workflows.is_empty() {
            Phase::Empty
        } else if self.selected.is_none() {
            Phase::SelectionPending
        } else if self.detail.is_none() {
            Phase::Selected
        } else {
            Phase::DetailLoaded
        }
    }

    pub fn handle(&mut self, event: Event) -> Vec<Action> {
        debug!(?event, "session event");
        match event {
            Event::Refresh => vec![self.fetch_list()],
            Event::Search(search) => {
                self.query.search = search.filter(|s| !s.trim().is_empty());
                self.query.cursor = None;
                vec![self.fetch_list()]
            }
            Event::FilterActive(active) => {
                self.query.active = active;
                self.query.cursor = None;
                vec![self.fetch_list()]
            }
            Event::Select(index) => self.select(index),
            Event::ClearSelection => {
                self.clear_selection();
                vec![]
            }
            Event::SetActive(active) => match self.selected_id.clone() {
                Some(id) => vec![Action::SetActive { id, active }],
                None => self.reject("No workflow selected"),
            },
            Event::CreateWorkflow { name, active } => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return self.reject("Workflow name is empty");
                }
                vec![Action::CreateWorkflow { name, active }]
            }
            Event::DeleteSelected => match self.selected_id.clone() {
                Some(id) => vec![Action::DeleteWorkflow(id)],
                None => self.reject("No workflow selected"),
            },
            Event::EditNode(edit) => self.edit_node(&edit),

            Event::ListLoaded(page) => self.list_loaded(page),
            Event::WorkflowLoaded(workflow) => {
                match &self.selected_id {
                    Some(id) if id.same_as(&workflow.id) => self.detail = Some(workflow),
                    _ => debug!(id = %workflow.id, "ignoring workflow for stale selection"),
                }
                vec![]
            }
            Event::ExecutionsLoaded { workflow_id, page } => {
                match (&self.selected_id, &workflow_id) {
                    (Some(selected), Some(id)) if selected.same_as(id) => {
                        self.executions = page.data;
                    }
                    _ => debug!("ignoring executions for stale selection"),
                }
                vec![]
            }
            Event::Mutated(mutation) => self.mutated(mutation),
            Event::Failed { action, message } => {
                if action == ActionKind::FetchWorkflow {
                    self.detail = None;
                }
                self.notice = Some(Notice::Error(format!("{}: {}", action.describe(), message)));
                vec![]
            }
        }
    }

    fn fetch_list(&self) -> Action {
        Action::FetchList(self.query.clone())
    }

    fn fetch_selected(&self) -> Vec<Action> {
        match &self.selected_id {
            Some(id) => vec![
                Action::FetchWorkflow(id.clone()),
                Action::FetchExecutions(ExecutionQuery::for_workflow(
                    id.clone(),
                    self.execution_limit,
                )),
            ],
            None => vec![],
        }
    }

    fn reject(&mut self, message: &str) -> Vec<Action> {
        self.notice = Some(Notice::Error(message.to_string()));
        vec![]
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.selected_id = None;
        self.detail = None;
        self.executions.clear();
    }

    fn select(&mut self, index: usize) -> Vec<Action> {
        let Some(summary) = self.workflows.get(index) else {
            return self.reject(&format!("No workflow at position {}", index + 1));
        };
        let id = summary.id.clone();
        self.clear_selection();
        self.selected = Some(index);
        self.selected_id = Some(id);
        self.fetch_selected()
    }

    fn list_loaded(&mut self, page: Page<WorkflowSummary>) -> Vec<Action> {
        self.loaded = true;
        self.workflows = page.data;
        self.next_cursor = page.next_cursor;

        if self.workflows.is_empty() {
            self.clear_selection();
            self.notice = Some(Notice::Info("No workflows found".to_string()));
            return vec![];
        }

        let position = self.selected_id.as_ref().and_then(|id| {
            self.workflows
                .iter()
                .position(|w| w.id.same_as(id))
        });
        match position {
            Some(index) => {
                self.selected = Some(index);
                self.fetch_selected()
            }
            None => {
                self.clear_selection();
                vec![]
            }
        }
    }

    fn edit_node(&mut self, edit: &NodeEdit) -> Vec<Action> {
        let Some(detail) = &self.detail else {
            return self.reject("No workflow loaded");
        };
        // Validated against the detail as it is now, not as it was rendered.
        match apply_node_edit(detail, edit) {
            Ok(updated) => vec![Action::UpdateWorkflow(Box::new(updated))],
            Err(e) => {
                let message = format!("Error updating node: {}", e);
                self.reject(&message)
            }
        }
    }

    fn mutated(&mut self, mutation: Mutation) -> Vec<Action> {
        let message = match &mutation {
            Mutation::ActiveChanged { active: true, .. } => "Workflow activated".to_string(),
            Mutation::ActiveChanged { active: false, .. } => "Workflow deactivated".to_string(),
            Mutation::Created { name, .. } => format!("Workflow '{}' created", name),
            Mutation::Deleted(_) => "Workflow deleted".to_string(),
            Mutation::Updated(_) => "Node updated successfully".to_string(),
        };
        self.notice = Some(Notice::Success(message));

        match mutation {
            Mutation::Deleted(id) => {
                if self.selected_id.as_ref().is_some_and(|s| s.same_as(&id)) {
                    self.clear_selection();
                }
            }
            Mutation::Created { id: Some(id), .. } => {
                self.clear_selection();
                self.selected_id = Some(id);
            }
            _ => {}
        }

        // The server is the source of truth; never patch local state.
        vec![self.fetch_list()]
    }
}

use crate::{ExecutionStatus, ResourceId};

pub const DEFAULT_LIST_LIMIT: u32 = 50;
pub const DEFAULT_EXECUTION_LIMIT: u32 = 20;

/// Filters for the workflows collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowQuery {
    pub limit: u32,
    pub search: Option<String>,
    pub active: Option<bool>,
    pub cursor: Option<String>,
}

impl Default for WorkflowQuery {
    fn default() -> Self {
        Self::new(DEFAULT_LIST_LIMIT)
    }
}

impl WorkflowQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            search: None,
            active: None,
            cursor: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Query-string pairs in a stable order. Blank search terms are omitted.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("limit".to_string(), self.limit.to_string())];
        if let Some(search) = non_blank(&self.search) {
            pairs.push(("search".to_string(), search.to_string()));
        }
        if let Some(active) = self.active {
            pairs.push(("active".to_string(), active.to_string()));
        }
        if let Some(cursor) = non_blank(&self.cursor) {
            pairs.push(("cursor".to_string(), cursor.to_string()));
        }
        pairs
    }
}

/// Filters for the executions collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionQuery {
    pub workflow_id: Option<ResourceId>,
    pub limit: u32,
    pub status: Option<ExecutionStatus>,
    pub cursor: Option<String>,
}

impl Default for ExecutionQuery {
    fn default() -> Self {
        Self {
            workflow_id: None,
            limit: DEFAULT_EXECUTION_LIMIT,
            status: None,
            cursor: None,
        }
    }
}

impl ExecutionQuery {
    pub fn for_workflow(workflow_id: ResourceId, limit: u32) -> Self {
        Self {
            workflow_id: Some(workflow_id),
            limit,
            ..Default::default()
        }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = &self.workflow_id {
            pairs.push(("workflowId".to_string(), id.to_string()));
        }
        pairs.push(("limit".to_string(), self.limit.to_string()));
        if let Some(status) = &self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(cursor) = non_blank(&self.cursor) {
            pairs.push(("cursor".to_string(), cursor.to_string()));
        }
        pairs
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

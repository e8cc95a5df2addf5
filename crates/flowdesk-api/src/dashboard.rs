//! Drives a [`Session`] against a [`Gateway`].

use crate::{Gateway, UpdateMethod, executions, workflows};
use flowdesk_core::session::{Action, Event, Mutation, Session};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Owns the session and performs the actions it asks for, one outbound call
/// at a time, until the session is settled.
pub struct Dashboard<G: Gateway> {
    gateway: G,
    session: Session,
    update_method: UpdateMethod,
}

impl<G: Gateway> Dashboard<G> {
    pub fn new(gateway: G, session: Session, update_method: UpdateMethod) -> Self {
        Self {
            gateway,
            session,
            update_method,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Feeds `event` to the session and performs every resulting action,
    /// including the ones produced by feeding results back. Returns the
    /// number of calls made.
    pub async fn dispatch(&mut self, event: Event) -> usize {
        let mut pending: VecDeque<Action> = self.session.handle(event).into();
        let mut performed = 0;
        while let Some(action) = pending.pop_front() {
            let result = self.perform(action).await;
            performed += 1;
            pending.extend(self.session.handle(result));
        }
        debug!(performed, "Session settled");
        performed
    }

    async fn perform(&self, action: Action) -> Event {
        let kind = action.kind();
        let outcome = match action {
            Action::FetchList(query) => workflows::list_workflows(&self.gateway, &query)
                .await
                .map(Event::ListLoaded),
            Action::FetchWorkflow(id) => workflows::get_workflow(&self.gateway, &id)
                .await
                .map(Event::WorkflowLoaded),
            Action::FetchExecutions(query) => executions::list_executions(&self.gateway, &query)
                .await
                .map(|page| Event::ExecutionsLoaded {
                    workflow_id: query.workflow_id.clone(),
                    page,
                }),
            Action::SetActive { id, active } => workflows::set_active(&self.gateway, &id, active)
                .await
                .map(|_| Event::Mutated(Mutation::ActiveChanged { id, active })),
            Action::CreateWorkflow { name, active } => {
                workflows::create_workflow(&self.gateway, &name, active)
                    .await
                    .map(|id| Event::Mutated(Mutation::Created { name, id }))
            }
            Action::DeleteWorkflow(id) => workflows::delete_workflow(&self.gateway, &id)
                .await
                .map(|()| Event::Mutated(Mutation::Deleted(id))),
            Action::UpdateWorkflow(workflow) => {
                workflows::update_workflow(&self.gateway, &workflow, self.update_method)
                    .await
                    .map(|_| Event::Mutated(Mutation::Updated(workflow.id.clone())))
            }
        };
        outcome.unwrap_or_else(|e| {
            warn!(?kind, "{}: {}", kind.describe(), e);
            Event::Failed {
                action: kind,
                message: e.to_string(),
            }
        })
    }
}

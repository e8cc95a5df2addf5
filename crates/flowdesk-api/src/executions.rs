use crate::types::decode;
use crate::{ApiError, ApiRequest, Gateway};
use flowdesk_core::{Execution, ExecutionQuery, Page};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Executions in the order the server returned them.
pub async fn list_executions<G: Gateway>(
    gateway: &G,
    query: &ExecutionQuery,
) -> Result<Page<Execution>, ApiError> {
    list_executions_as(gateway, query).await
}

/// [`list_executions`] decoded into any item type; `Value` keeps each item
/// exactly as the server sent it.
pub async fn list_executions_as<G: Gateway, T: DeserializeOwned>(
    gateway: &G,
    query: &ExecutionQuery,
) -> Result<Page<T>, ApiError> {
    let value = gateway
        .request(ApiRequest::get("executions").with_query(query.to_pairs()))
        .await?;
    let page: Page<T> = decode(value)?;
    debug!(
        workflow = ?query.workflow_id.as_ref().map(|id| id.to_string()),
        count = page.data.len(),
        "Listed executions"
    );
    Ok(page)
}

pub mod executions;
pub mod nodes;
pub mod shell;
pub mod workflows;

use anyhow::Result;
use flowdesk_core::ResourceId;
use serde::Serialize;
use std::io::Write;

pub(crate) fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Ids on the command line are always text; the server accepts both forms.
pub(crate) fn parse_id(id: &str) -> ResourceId {
    ResourceId::from(id.trim())
}

mod client;
mod dashboard;
mod error;
pub mod executions;
mod gateway;
pub mod nodes;
mod types;
pub mod workflows;

#[cfg(any(test, feature = "test-stubs"))]
pub mod test_stubs;

pub use client::*;
pub use dashboard::*;
pub use error::*;
pub use gateway::*;
pub use types::*;

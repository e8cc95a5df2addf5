mod connection;
mod node_edit;
mod query;
pub mod session;
mod workflow;

pub use connection::*;
pub use node_edit::*;
pub use query::*;
pub use workflow::*;

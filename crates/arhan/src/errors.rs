use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised at the tool layer. These never escape the dispatcher: they are
/// either reported and the call skipped, or turned into a failed tool result.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Malformed tool arguments: {0}")]
    MalformedArguments(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

use crate::confirm::ConfirmationRequest;
use crate::errors::AgentError;
use crate::models::tool::{ToolCall, ToolResult};
use crate::providers::errors::ProviderError;
use crate::tools::ToolArgs;

/// Something the agent wants the user to see
#[derive(Debug)]
pub enum AgentEvent<'a> {
    /// A model request is in flight
    Thinking,
    /// A slice of assistant text, as it arrives
    TextDelta(&'a str),
    /// The assistant finished streaming non-empty text
    TextComplete,
    ToolRequested {
        call: &'a ToolCall,
        args: &'a ToolArgs,
    },
    ToolCompleted {
        call: &'a ToolCall,
        result: &'a ToolResult,
    },
    ToolCancelled {
        call: &'a ToolCall,
    },
    /// The call was dropped without running, e.g. its arguments were not JSON
    ToolSkipped {
        call: &'a ToolCall,
        error: &'a AgentError,
    },
    /// The model described a tool call instead of making one
    NarrationDetected,
    Error(&'a ProviderError),
    Warning(&'a str),
    BudgetExhausted {
        max_iterations: usize,
    },
}

/// The presentation surface driven by the agent loop: output is rendered as
/// events, and side-effecting tool calls are put to the user for approval.
pub trait Interface {
    fn render(&mut self, event: AgentEvent<'_>);

    /// Block until the user approves or rejects the request
    fn confirm(&mut self, request: &ConfirmationRequest<'_>) -> bool;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Records rendered events as strings and answers confirmations from a script
    #[derive(Default)]
    pub struct MockInterface {
        pub events: Vec<String>,
        pub streamed: String,
        pub confirmations: Vec<String>,
        pub answers: Vec<bool>,
    }

    impl MockInterface {
        pub fn answering(answers: Vec<bool>) -> Self {
            Self {
                answers,
                ..Default::default()
            }
        }

        pub fn count(&self, prefix: &str) -> usize {
            self.events.iter().filter(|e| e.starts_with(prefix)).count()
        }
    }

    impl Interface for MockInterface {
        fn render(&mut self, event: AgentEvent<'_>) {
            let line = match event {
                AgentEvent::Thinking => "thinking".to_string(),
                AgentEvent::TextDelta(text) => {
                    self.streamed.push_str(text);
                    format!("text:{}", text)
                }
                AgentEvent::TextComplete => "text_complete".to_string(),
                AgentEvent::ToolRequested { call, .. } => format!("requested:{}", call.name),
                AgentEvent::ToolCompleted { call, result } => {
                    format!("completed:{}:{}", call.name, result.success)
                }
                AgentEvent::ToolCancelled { call } => format!("cancelled:{}", call.name),
                AgentEvent::ToolSkipped { call, .. } => format!("skipped:{}", call.name),
                AgentEvent::NarrationDetected => "narration".to_string(),
                AgentEvent::Error(e) => format!("error:{}", e),
                AgentEvent::Warning(w) => format!("warning:{}", w),
                AgentEvent::BudgetExhausted { max_iterations } => {
                    format!("budget_exhausted:{}", max_iterations)
                }
            };
            self.events.push(line);
        }

        fn confirm(&mut self, request: &ConfirmationRequest<'_>) -> bool {
            self.confirmations.push(request.call.name.clone());
            if self.answers.is_empty() {
                request.default
            } else {
                self.answers.remove(0)
            }
        }
    }
}

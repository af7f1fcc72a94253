use tracing::{debug, warn};

use crate::confirm::ConfirmationGate;
use crate::errors::AgentError;
use crate::history::ConversationStore;
use crate::interface::{AgentEvent, Interface};
use crate::models::message::Message;
use crate::models::tool::{ToolCall, ToolResult};
use crate::tools::{ToolArgs, ToolExecutor};

/// Stored as the tool message when the user declines a call
pub const CANCELLED_MESSAGE: &str = "Tool execution was cancelled by the user";

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The tool ran; its result was stored
    Executed(ToolResult),
    /// The arguments were JSON but did not fit the tool; the error was stored as a
    /// failed result so the model can correct itself
    Invalid(AgentError),
    /// The user declined
    Cancelled,
    /// The arguments were not JSON; nothing was stored
    Skipped(AgentError),
}

/// Runs the tool calls of one assistant turn, one at a time
pub struct ToolDispatcher<'a> {
    executor: &'a dyn ToolExecutor,
    gate: &'a ConfirmationGate,
}

impl<'a> ToolDispatcher<'a> {
    pub fn new(executor: &'a dyn ToolExecutor, gate: &'a ConfirmationGate) -> Self {
        Self { executor, gate }
    }

    pub async fn dispatch(
        &self,
        call: &ToolCall,
        store: &mut ConversationStore,
        interface: &mut dyn Interface,
    ) -> DispatchOutcome {
        let args = match ToolArgs::parse(&call.name, &call.arguments) {
            Ok(args) => args,
            Err(error @ AgentError::MalformedArguments(_)) => {
                warn!(tool = %call.name, id = %call.id, %error, "skipping tool call");
                interface.render(AgentEvent::ToolSkipped {
                    call,
                    error: &error,
                });
                return DispatchOutcome::Skipped(error);
            }
            Err(error) => {
                let result = ToolResult::failure(error.to_string());
                store.add_message(Message::tool(&call.id).with_text(result.content()));
                interface.render(AgentEvent::ToolCompleted {
                    call,
                    result: &result,
                });
                return DispatchOutcome::Invalid(error);
            }
        };

        interface.render(AgentEvent::ToolRequested { call, args: &args });

        if !self.gate.confirm(call, &args, interface) {
            debug!(tool = %call.name, id = %call.id, "tool call declined");
            store.add_message(Message::tool(&call.id).with_text(CANCELLED_MESSAGE));
            interface.render(AgentEvent::ToolCancelled { call });
            return DispatchOutcome::Cancelled;
        }

        let result = self.executor.execute(&args).await;
        debug!(tool = %call.name, id = %call.id, success = result.success, "tool call finished");

        store.add_message(Message::tool(&call.id).with_text(result.content()));
        interface.render(AgentEvent::ToolCompleted {
            call,
            result: &result,
        });
        DispatchOutcome::Executed(result)
    }
}

use crate::interface::Interface;
use crate::models::tool::ToolCall;
use crate::tools::{ToolArgs, ToolName};

const DESTRUCTIVE_KEYWORDS: [&str; 3] = ["rm ", "delete", "remove"];

/// Whether a tool call must be approved by the user before it runs.
///
/// Writes and shell commands always need approval, whatever their arguments;
/// reads and listings never do.
pub fn needs_confirmation(args: &ToolArgs) -> bool {
    match args {
        ToolArgs::WriteFile { .. } => true,
        ToolArgs::RunCommand { .. } => true,
        ToolArgs::ReadFile { .. } | ToolArgs::ListFiles { .. } => false,
    }
}

/// Shell commands that look like they delete something. Such commands already
/// need approval; this only changes how the prompt is presented.
pub fn is_destructive(args: &ToolArgs) -> bool {
    match args {
        ToolArgs::RunCommand { command, .. } => {
            let command = command.to_lowercase();
            DESTRUCTIVE_KEYWORDS.iter().any(|k| command.contains(k))
        }
        _ => false,
    }
}

/// The answer suggested to the user when asking about a tool
pub fn default_answer(tool: ToolName) -> bool {
    matches!(tool, ToolName::ReadFile | ToolName::ListFiles)
}

/// A pending approval, as shown to the user
#[derive(Debug)]
pub struct ConfirmationRequest<'a> {
    pub call: &'a ToolCall,
    pub args: &'a ToolArgs,
    pub default: bool,
    pub destructive: bool,
}

/// Human-in-the-loop approval for side-effecting tool calls
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationGate {
    auto_approve: bool,
}

impl ConfirmationGate {
    pub fn new(auto_approve: bool) -> Self {
        Self { auto_approve }
    }

    pub fn needs_confirmation(&self, args: &ToolArgs) -> bool {
        needs_confirmation(args)
    }

    /// Returns whether the call may run, asking the user when the policy requires it
    pub fn confirm(&self, call: &ToolCall, args: &ToolArgs, interface: &mut dyn Interface) -> bool {
        if !self.needs_confirmation(args) || self.auto_approve {
            return true;
        }

        interface.confirm(&ConfirmationRequest {
            call,
            args,
            default: default_answer(args.name()),
            destructive: is_destructive(args),
        })
    }
}

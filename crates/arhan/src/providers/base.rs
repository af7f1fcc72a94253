use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::errors::ProviderError;
use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// A fragment of a tool call. Fragments sharing an `index` belong to the same call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One incremental unit of a streamed response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallDelta>,
}

impl Delta {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(delta: ToolCallDelta) -> Self {
        Self {
            content: None,
            tool_calls: vec![delta],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Delta(Delta),
    Usage(Usage),
    /// The response is complete; nothing follows
    Done,
}

pub type EventReceiver = mpsc::Receiver<Result<StreamEvent, ProviderError>>;

/// Capacity of the channel between the transport and the accumulator
pub const STREAM_BUFFER: usize = 64;

/// A chat-completion endpoint that streams its responses
#[async_trait]
pub trait Provider: Send + Sync {
    /// Start one model turn over the full conversation.
    ///
    /// Errors before the first byte are returned directly; later failures arrive on
    /// the channel. Dropping the receiver cancels the stream.
    async fn stream(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<EventReceiver, ProviderError>;
}

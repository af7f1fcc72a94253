//! Reassembles a streamed model turn.
//!
//! Text is forwarded to the interface as it arrives. Tool calls come in as
//! fragments tagged with a position index and are rebuilt slot by slot; the
//! index is trusted as given, so a gap in the indices stays an empty slot.

use std::collections::BTreeMap;

use tracing::debug;

use crate::interface::{AgentEvent, Interface};
use crate::models::message::Message;
use crate::models::tool::ToolCall;
use crate::providers::base::{Delta, EventReceiver, StreamEvent, Usage};
use crate::providers::errors::ProviderError;

/// A complete model turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledResponse {
    pub content: String,
    slots: BTreeMap<usize, ToolCall>,
    pub usage: Option<Usage>,
}

impl AssembledResponse {
    /// The call assembled at a position index, if any fragment named it
    pub fn slot(&self, index: usize) -> Option<&ToolCall> {
        self.slots.get(&index)
    }

    /// One past the highest index seen, counting empty slots in between
    pub fn slot_count(&self) -> usize {
        self.slots
            .keys()
            .next_back()
            .map_or(0, |last| last.saturating_add(1))
    }

    /// Assembled calls in index order, skipping empty slots
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.slots.values()
    }

    pub fn into_message(self) -> Message {
        let tool_calls = self.slots.into_values().collect();
        Message::assistant()
            .with_text(self.content)
            .with_tool_calls(tool_calls)
    }
}

#[derive(Debug, Default)]
pub struct StreamAccumulator {
    response: AssembledResponse,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one delta into the response
    pub fn push(&mut self, delta: &Delta) {
        if let Some(text) = &delta.content {
            self.response.content.push_str(text);
        }

        for fragment in &delta.tool_calls {
            let call = self
                .response
                .slots
                .entry(fragment.index)
                .or_insert_with(|| ToolCall::new(fragment.id.clone().unwrap_or_default(), "", ""));
            if let Some(id) = &fragment.id {
                call.id.clone_from(id);
            }
            if let Some(name) = &fragment.name {
                call.name.clone_from(name);
            }
            if let Some(arguments) = &fragment.arguments {
                call.arguments.push_str(arguments);
            }
        }
    }

    pub fn finish(self) -> AssembledResponse {
        self.response
    }

    /// Drain a stream until its `Done` sentinel.
    ///
    /// Nothing is returned for a turn that failed part way, so a partial
    /// assistant message never reaches the conversation.
    pub async fn consume(
        mut self,
        mut rx: EventReceiver,
        interface: &mut dyn Interface,
    ) -> Result<AssembledResponse, ProviderError> {
        loop {
            match rx.recv().await {
                Some(Ok(StreamEvent::Delta(delta))) => {
                    if let Some(text) = delta.content.as_deref().filter(|t| !t.is_empty()) {
                        interface.render(AgentEvent::TextDelta(text));
                    }
                    self.push(&delta);
                }
                Some(Ok(StreamEvent::Usage(usage))) => {
                    debug!(
                        input_tokens = ?usage.input_tokens,
                        output_tokens = ?usage.output_tokens,
                        total_tokens = ?usage.total_tokens,
                        "token usage"
                    );
                    self.response.usage = Some(usage);
                }
                Some(Ok(StreamEvent::Done)) => break,
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(ProviderError::StreamInterrupted(
                        "the stream closed before the response completed".to_string(),
                    ))
                }
            }
        }

        if !self.response.content.is_empty() {
            interface.render(AgentEvent::TextComplete);
        }
        Ok(self.finish())
    }
}

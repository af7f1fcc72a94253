use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{
    Delta, EventReceiver, Provider, StreamEvent, ToolCallDelta, STREAM_BUFFER,
};
use crate::providers::errors::ProviderError;

/// What the mock sends for one model turn
pub type MockTurn = Result<Vec<Result<StreamEvent, ProviderError>>, ProviderError>;

/// A mock provider that streams pre-configured turns for testing
pub struct MockProvider {
    turns: Arc<Mutex<Vec<MockTurn>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of turns
    pub fn new(turns: Vec<MockTurn>) -> Self {
        Self {
            turns: Arc::new(Mutex::new(turns)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The conversations each request was made with, shared so it can be
    /// inspected after the provider moves into an agent
    pub fn requests(&self) -> Arc<Mutex<Vec<Vec<Message>>>> {
        Arc::clone(&self.requests)
    }

    pub fn text(text: &str) -> MockTurn {
        Ok(vec![
            Ok(StreamEvent::Delta(Delta::text(text))),
            Ok(StreamEvent::Done),
        ])
    }

    /// A turn that calls each `(id, name, arguments)` in order, one fragment per call
    pub fn tool_calls(calls: &[(&str, &str, &str)]) -> MockTurn {
        let mut events: Vec<_> = calls
            .iter()
            .enumerate()
            .map(|(index, (id, name, arguments))| {
                Ok(StreamEvent::Delta(Delta::tool_call(ToolCallDelta {
                    index,
                    id: Some(id.to_string()),
                    name: Some(name.to_string()),
                    arguments: Some(arguments.to_string()),
                })))
            })
            .collect();
        events.push(Ok(StreamEvent::Done));
        Ok(events)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn stream(
        &self,
        _model: &str,
        messages: &[Message],
        _tools: &[Tool],
    ) -> Result<EventReceiver, ProviderError> {
        self.requests.lock().unwrap().push(messages.to_vec());

        let turn = {
            let mut turns = self.turns.lock().unwrap();
            if turns.is_empty() {
                // Empty response if no more pre-configured turns
                Self::text("")
            } else {
                turns.remove(0)
            }
        };

        let events = turn?;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER.max(events.len()));
        for event in events {
            let _ = tx.try_send(event);
        }
        Ok(rx)
    }
}

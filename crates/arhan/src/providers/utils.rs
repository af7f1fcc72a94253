use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::trace;

use super::base::{Delta, StreamEvent, ToolCallDelta, Usage};
use super::errors::{classify_error_payload, ProviderError};
use crate::models::message::Message;
use crate::models::tool::Tool;

/// Convert internal Message format to OpenAI's API message specification.
///
/// The structs already follow the OpenAI shape; the one adjustment is that an
/// assistant turn which only carries tool calls sends `null` content, since some
/// upstream models reject empty text.
pub fn messages_to_openai_spec(messages: &[Message]) -> Result<Vec<Value>> {
    messages
        .iter()
        .map(|message| {
            let mut converted = serde_json::to_value(message)?;
            if message.has_tool_calls() && message.content.is_empty() {
                converted["content"] = Value::Null;
            }
            Ok(converted)
        })
        .collect()
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// The payload of one server-sent `data:` line
#[derive(Debug, Clone, PartialEq)]
pub enum SseData {
    Json(String),
    Done,
}

/// Splits a server-sent-event byte stream into `data:` payloads.
///
/// Bytes are buffered until a full line is available, so a UTF-8 character split
/// across two network chunks is decoded intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseData> {
        self.buffer.extend_from_slice(bytes);

        let mut data = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            if let Some(payload) = decode_line(&String::from_utf8_lossy(&line)) {
                data.push(payload);
            }
        }
        data
    }

    /// Flush a final line that was not newline terminated
    pub fn finish(&mut self) -> Option<SseData> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&String::from_utf8_lossy(&rest))
    }
}

fn decode_line(line: &str) -> Option<SseData> {
    let line = line.trim_end_matches(['\r', '\n']);
    // Blank lines separate events and lines starting with ':' are keep-alive comments
    let data = line.strip_prefix("data:")?.trim();
    match data {
        "" => None,
        "[DONE]" => Some(SseData::Done),
        json => Some(SseData::Json(json.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<StreamUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct StreamToolCallDelta {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamUsage {
    prompt_tokens: Option<i32>,
    completion_tokens: Option<i32>,
    total_tokens: Option<i32>,
}

/// Convert one streamed JSON chunk into events.
///
/// Chunks carrying an `error` object are classified; chunks that do not parse are
/// ignored, as providers interleave their own status payloads.
pub fn stream_chunk_to_events(data: &str, model: &str) -> Result<Vec<StreamEvent>, ProviderError> {
    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            trace!(data, error = %e, "ignoring unparseable stream chunk");
            return Ok(Vec::new());
        }
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        return Err(classify_error_payload(error, model));
    }

    let chunk: StreamChunk = match serde_json::from_value(value) {
        Ok(chunk) => chunk,
        Err(e) => {
            trace!(data, error = %e, "ignoring unexpected stream chunk");
            return Ok(Vec::new());
        }
    };

    let mut events = Vec::new();

    if let Some(delta) = chunk.choices.into_iter().next().and_then(|c| c.delta) {
        let tool_calls: Vec<ToolCallDelta> = delta
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let (name, arguments) = match tc.function {
                    Some(function) => (function.name, function.arguments),
                    None => (None, None),
                };
                ToolCallDelta {
                    index: tc.index,
                    id: tc.id.filter(|id| !id.is_empty()),
                    name: name.filter(|name| !name.is_empty()),
                    arguments,
                }
            })
            .collect();

        let content = delta.content.filter(|c| !c.is_empty());
        if content.is_some() || !tool_calls.is_empty() {
            events.push(StreamEvent::Delta(Delta {
                content,
                tool_calls,
            }));
        }
    }

    if let Some(usage) = chunk.usage {
        events.push(StreamEvent::Usage(Usage::new(
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens,
        )));
    }

    Ok(events)
}

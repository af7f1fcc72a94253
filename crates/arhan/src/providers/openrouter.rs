use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::base::{EventReceiver, Provider, StreamEvent, STREAM_BUFFER};
use super::configs::OpenRouterProviderConfig;
use super::errors::{classify, ProviderError};
use super::utils::{
    messages_to_openai_spec, stream_chunk_to_events, tools_to_openai_spec, SseData, SseDecoder,
};
use crate::models::message::Message;
use crate::models::tool::Tool;

type EventSender = mpsc::Sender<Result<StreamEvent, ProviderError>>;

pub struct OpenRouterProvider {
    client: Client,
    config: OpenRouterProviderConfig,
}

impl OpenRouterProvider {
    pub fn new(config: OpenRouterProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn build_payload(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Value, ProviderError> {
        let messages_spec = messages_to_openai_spec(messages)
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;
        let tools_spec =
            tools_to_openai_spec(tools).map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;

        let mut payload = json!({
            "model": model,
            "messages": messages_spec,
            "stream": true,
        });

        if let Some(object) = payload.as_object_mut() {
            if !tools_spec.is_empty() {
                object.insert("tools".to_string(), json!(tools_spec));
            }
            if let Some(temp) = self.config.temperature {
                object.insert("temperature".to_string(), json!(temp));
            }
            if let Some(tokens) = self.config.max_tokens {
                object.insert("max_tokens".to_string(), json!(tokens));
            }
        }

        Ok(payload)
    }

    async fn post(&self, payload: &Value, model: &str) -> Result<Response, ProviderError> {
        let url = format!(
            "{}/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("HTTP-Referer", &self.config.app_url)
            .header("X-Title", &self.config.app_name)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "model request failed");
        Err(classify(Some(status.as_u16()), &body, model))
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    async fn stream(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<EventReceiver, ProviderError> {
        let payload = self.build_payload(model, messages, tools)?;
        let response = self.post(&payload, model).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(forward_events(response, model.to_string(), tx));
        Ok(rx)
    }
}

/// Pump the response body into the channel until `[DONE]`, an error, or the
/// receiver going away.
async fn forward_events(response: Response, model: String, tx: EventSender) {
    let mut bytes = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk) = bytes.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx
                    .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                    .await;
                return;
            }
        };

        for data in decoder.push(&chunk) {
            if !send_data(&tx, data, &model).await {
                return;
            }
        }
    }

    if let Some(data) = decoder.finish() {
        if !send_data(&tx, data, &model).await {
            return;
        }
    }

    warn!("stream ended without a [DONE] marker");
    let _ = tx
        .send(Err(ProviderError::StreamInterrupted(
            "connection closed before the response completed".to_string(),
        )))
        .await;
}

// Returns false once nothing more should be sent
async fn send_data(tx: &EventSender, data: SseData, model: &str) -> bool {
    match data {
        SseData::Done => {
            let _ = tx.send(Ok(StreamEvent::Done)).await;
            false
        }
        SseData::Json(json) => match stream_chunk_to_events(&json, model) {
            Ok(events) => {
                for event in events {
                    if tx.send(Ok(event)).await.is_err() {
                        debug!("stream receiver dropped, cancelling");
                        return false;
                    }
                }
                true
            }
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                false
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::ToolCall;
    use crate::providers::base::{Delta, EventReceiver, ToolCallDelta, Usage};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "google/gemini-2.0-flash-exp:free";

    async fn _setup_mock_server(response: ResponseTemplate) -> (MockServer, OpenRouterProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        let mut config = OpenRouterProviderConfig::new("test_api_key".to_string());
        config.host = mock_server.uri();

        let provider = OpenRouterProvider::new(config).unwrap();
        (mock_server, provider)
    }

    fn sse(chunks: &[Value]) -> ResponseTemplate {
        let mut body = String::new();
        for chunk in chunks {
            body.push_str(&format!("data: {}\n\n", chunk));
        }
        body.push_str("data: [DONE]\n\n");
        ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
    }

    async fn drain(mut rx: EventReceiver) -> Vec<Result<StreamEvent, ProviderError>> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_stream_text_and_usage() -> Result<()> {
        let (_server, provider) = _setup_mock_server(sse(&[
            json!({"choices": [{"delta": {"role": "assistant", "content": "Hello"}}]}),
            json!({"choices": [{"delta": {"content": " there"}}]}),
            json!({"choices": [{"delta": {}, "finish_reason": "stop"}],
                   "usage": {"prompt_tokens": 12, "completion_tokens": 2, "total_tokens": 14}}),
        ]))
        .await;

        let messages = vec![Message::user().with_text("Hello?")];
        let rx = provider.stream(MODEL, &messages, &[]).await?;

        assert_eq!(
            drain(rx).await,
            vec![
                Ok(StreamEvent::Delta(Delta::text("Hello"))),
                Ok(StreamEvent::Delta(Delta::text(" there"))),
                Ok(StreamEvent::Usage(Usage::new(Some(12), Some(2), Some(14)))),
                Ok(StreamEvent::Done),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_stream_tool_call_fragments() -> Result<()> {
        let (_server, provider) = _setup_mock_server(sse(&[
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_1", "type": "function",
                 "function": {"name": "read_file", "arguments": "{\"pa"}}]}}]}),
            json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "th\":\"a.txt\"}"}}]}}]}),
        ]))
        .await;

        let rx = provider
            .stream(MODEL, &[Message::user().with_text("read a.txt")], &crate::tools::tools())
            .await?;
        let events = drain(rx).await;

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[1],
            Ok(StreamEvent::Delta(Delta::tool_call(ToolCallDelta {
                index: 0,
                id: None,
                name: None,
                arguments: Some("th\":\"a.txt\"}".into()),
            })))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_request_shape() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test_api_key"))
            .and(header("HTTP-Referer", "http://localhost"))
            .and(header("X-Title", "Arhan CLI"))
            .and(body_partial_json(json!({
                "model": MODEL,
                "stream": true,
                "max_tokens": 4096,
                "messages": [
                    {"role": "user", "content": "list"},
                    {"role": "assistant", "content": null, "tool_calls": [
                        {"id": "c1", "type": "function",
                         "function": {"name": "list_files", "arguments": "{}"}}]},
                    {"role": "tool", "content": "Empty directory", "tool_call_id": "c1"}
                ]
            })))
            .respond_with(sse(&[]))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut config = OpenRouterProviderConfig::new("test_api_key".to_string());
        config.host = format!("{}/", mock_server.uri());
        let provider = OpenRouterProvider::new(config)?;

        let messages = vec![
            Message::user().with_text("list"),
            Message::assistant().with_tool_calls(vec![ToolCall::new("c1", "list_files", "{}")]),
            Message::tool("c1").with_text("Empty directory"),
        ];
        let tools = crate::tools::tools();
        let rx = provider.stream(MODEL, &messages, &tools).await?;

        assert_eq!(drain(rx).await, vec![Ok(StreamEvent::Done)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_errors_are_classified() {
        let (_server, provider) = _setup_mock_server(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "No auth credentials found", "code": 401}})),
        )
        .await;
        let err = provider.stream(MODEL, &[], &[]).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Unauthorized("No auth credentials found".into())
        );

        let (_server, provider) = _setup_mock_server(ResponseTemplate::new(404)).await;
        let err = provider.stream("nope/model", &[], &[]).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::ModelNotFound {
                model: "nope/model".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unencodable_request_is_not_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(sse(&[]))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut config = OpenRouterProviderConfig::new("test_api_key".to_string());
        config.host = mock_server.uri();
        let provider = OpenRouterProvider::new(config).unwrap();

        let tool = Tool::new("list_files", "List", json!({"type": "object"}));
        let err = provider
            .stream(MODEL, &[], &[tool.clone(), tool])
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidRequest(ref m) if m.contains("Duplicate tool name")));
        assert!(!err.to_string().contains("network"));
    }

    #[tokio::test]
    async fn test_error_payload_mid_stream() -> Result<()> {
        let (_server, provider) = _setup_mock_server(sse(&[
            json!({"choices": [{"delta": {"content": "Hi"}}]}),
            json!({"error": {"message": "Rate limit exceeded: free-models-per-min", "code": 429}}),
        ]))
        .await;

        let events = drain(provider.stream(MODEL, &[], &[]).await?).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Err(ProviderError::RateLimited(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_done_is_interrupted() -> Result<()> {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n";
        let (_server, provider) =
            _setup_mock_server(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
                .await;

        let events = drain(provider.stream(MODEL, &[], &[]).await?).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Err(ProviderError::StreamInterrupted(_))));
        Ok(())
    }
}

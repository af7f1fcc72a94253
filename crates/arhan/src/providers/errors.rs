use serde_json::Value;
use thiserror::Error;

/// Failures talking to the model endpoint, rewritten into something the user can act on
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Model '{model}' was not found. Check the model id passed with --model; available models are listed at https://openrouter.ai/models")]
    ModelNotFound { model: String },

    #[error("Authentication failed ({0}). Check that OPENROUTER_API_KEY holds a valid key from https://openrouter.ai/keys")]
    Unauthorized(String),

    #[error("Rate limit reached ({0}). Wait a moment and try again, or pick another model with --model")]
    RateLimited(String),

    #[error("Context length exceeded ({0}). Start over with --clear or ask for a smaller task")]
    ContextLengthExceeded(String),

    #[error("Could not reach the model endpoint: {0}. Check your network connection")]
    Network(String),

    #[error("Could not build the model request: {0}")]
    InvalidRequest(String),

    #[error("The provider returned an error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("The response stream ended unexpectedly: {0}")]
    StreamInterrupted(String),
}

const CONTEXT_SIGNATURES: [&str; 4] = [
    "context_length_exceeded",
    "string_above_max_length",
    "maximum context length",
    "context length",
];
const MODEL_SIGNATURES: [&str; 5] = [
    "model not found",
    "model_not_found",
    "no endpoints found",
    "is not a valid model",
    "does not exist",
];
const AUTH_SIGNATURES: [&str; 5] = [
    "unauthorized",
    "invalid api key",
    "incorrect api key",
    "no auth credentials",
    "user not found",
];
const RATE_SIGNATURES: [&str; 3] = ["rate limit", "rate-limit", "too many requests"];

/// Classify a failed request by its status code, then by known text in the body.
pub fn classify(status: Option<u16>, body: &str, model: &str) -> ProviderError {
    let message = error_message(body);
    let lowered = body.to_lowercase();
    let matches = |signatures: &[&str]| signatures.iter().any(|s| lowered.contains(s));

    match status {
        Some(401) | Some(403) => return ProviderError::Unauthorized(message),
        Some(404) => {
            return ProviderError::ModelNotFound {
                model: model.to_string(),
            }
        }
        Some(429) => return ProviderError::RateLimited(message),
        _ => {}
    }

    if matches(&CONTEXT_SIGNATURES) {
        ProviderError::ContextLengthExceeded(message)
    } else if matches(&MODEL_SIGNATURES) {
        ProviderError::ModelNotFound {
            model: model.to_string(),
        }
    } else if matches(&AUTH_SIGNATURES) {
        ProviderError::Unauthorized(message)
    } else if matches(&RATE_SIGNATURES) {
        ProviderError::RateLimited(message)
    } else {
        ProviderError::Api {
            status: status.unwrap_or_default(),
            message,
        }
    }
}

/// Classify an `error` object delivered inside the stream
pub fn classify_error_payload(error: &Value, model: &str) -> ProviderError {
    let status = error.get("code").and_then(|code| match code {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    });
    classify(status, &error.to_string(), model)
}

// Pull the human readable message out of an error body when there is one
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("message"))
            .and_then(|m| m.as_str())
    });

    match message {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => "no details".to_string(),
        None => body.trim().to_string(),
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        ProviderError::Network(error.to_string())
    }
}

use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

use crate::{config::Config, errors::ProviderError};

/// One non-streaming chat completion call.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub model: String,
    pub temperature: f32,
}

/// A text-completion backend. `Ok(None)` means the call succeeded but the
/// provider returned no text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, ProviderError>;
}

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenAI-compatible chat completions, sent as bring-your-own-type requests
/// so the envelope can be checked field by field.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.openai_api_key.expose_secret().to_string())
            .with_api_base(config.openai_api_base.clone());

        Self {
            client: Client::with_config(openai_config),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Option<String>, ProviderError> {
        let body = ChatRequestBody {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            stream: false,
        };

        log::debug!(
            "Sending chat completion to model {} ({} system chars, {} user chars)",
            request.model,
            request.system.len(),
            request.user.len()
        );

        let response: Value = self
            .client
            .chat()
            .create_byot(body)
            .await
            .map_err(map_openai_error)?;

        choice_text(&response)
    }
}

/// Pulls `choices[0].message.content` out of a chat completion envelope.
pub fn choice_text(response: &Value) -> Result<Option<String>, ProviderError> {
    let choices = response
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::MalformedResponse("missing `choices` array".to_string()))?;

    let message = choices
        .first()
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| ProviderError::MalformedResponse("missing `choices[0].message`".to_string()))?;

    match message.get("content") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(ProviderError::MalformedResponse(
            "`choices[0].message.content` is not a string".to_string(),
        )),
    }
}

fn map_openai_error(err: OpenAIError) -> ProviderError {
    let message = err.to_string();
    match err {
        OpenAIError::ApiError(api) => {
            classify_api_error(api.code.as_deref(), api.r#type.as_deref(), &api.message)
        }
        OpenAIError::JSONDeserialize(..) => ProviderError::MalformedResponse(message),
        _ => ProviderError::Unavailable(message),
    }
}

/// Maps an OpenAI-style error body onto the provider error taxonomy.
pub fn classify_api_error(code: Option<&str>, kind: Option<&str>, message: &str) -> ProviderError {
    let markers = [code.unwrap_or_default(), kind.unwrap_or_default()];
    let has = |needles: &[&str]| {
        markers
            .iter()
            .any(|m| needles.iter().any(|n| m.eq_ignore_ascii_case(n)))
    };

    if has(&["invalid_api_key", "invalid_authentication", "authentication_error", "permission_error"])
        || message.contains("Incorrect API key")
    {
        ProviderError::Unauthorized(message.to_string())
    } else if has(&["rate_limit_exceeded", "insufficient_quota", "rate_limit_error", "requests"]) {
        ProviderError::RateLimited(message.to_string())
    } else {
        ProviderError::Unavailable(message.to_string())
    }
}

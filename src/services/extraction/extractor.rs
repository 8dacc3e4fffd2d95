use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::Config,
    errors::{ExtractionError, ProviderError},
    services::completion_provider::{CompletionProvider, CompletionRequest},
    services::extraction::{
        repair::repair_and_parse,
        shape::{stringify_literals, OutputShape},
    },
};

const RETRY_PREAMBLE: &str = "Your previous response was rejected:";

/// The user side of an extraction: one prompt, or a batch answered in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserPrompts {
    Single(String),
    Batch(Vec<String>),
}

impl UserPrompts {
    pub fn is_batch(&self) -> bool {
        matches!(self, UserPrompts::Batch(_))
    }

    pub fn len(&self) -> usize {
        match self {
            UserPrompts::Single(_) => 1,
            UserPrompts::Batch(prompts) => prompts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn user_content(&self) -> String {
        match self {
            UserPrompts::Single(prompt) => prompt.clone(),
            UserPrompts::Batch(prompts) => {
                serde_json::to_string(prompts).unwrap_or_else(|_| prompts.join("\n"))
            }
        }
    }
}

impl From<&str> for UserPrompts {
    fn from(prompt: &str) -> Self {
        UserPrompts::Single(prompt.to_string())
    }
}

impl From<String> for UserPrompts {
    fn from(prompt: String) -> Self {
        UserPrompts::Single(prompt)
    }
}

impl From<Vec<String>> for UserPrompts {
    fn from(prompts: Vec<String>) -> Self {
        UserPrompts::Batch(prompts)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractOptions {
    pub model: String,
    pub temperature: f32,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 1.0,
            max_attempts: 3,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ExtractOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.openai_model.clone(),
            temperature: config.openai_temperature,
            max_attempts: config.extraction_max_attempts,
            timeout: config.provider_timeout(),
        }
    }
}

/// Result of a successful extraction, mirroring the prompt form.
#[derive(Clone, Debug, PartialEq)]
pub enum Extracted<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Extracted<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Extracted::One(item) => vec![item],
            Extracted::Many(items) => items,
        }
    }
}

/// One request/response/validate round trip. Lives only for the duration
/// of its iteration of the retry loop.
struct ExtractionAttempt {
    number: u32,
    request: CompletionRequest,
}

enum AttemptError {
    Provider(ProviderError),
    Rejected(String),
}

/// Builds the system instruction for one attempt. Pure: depends only on the
/// shape, the prompt form and the previous attempt's failure reason.
pub fn build_system_instruction(
    base: &str,
    shape: &OutputShape,
    prompts: &UserPrompts,
    prior_failure: Option<&str>,
) -> String {
    let mut instruction = format!(
        "{}\n\nRespond only with valid JSON and no other text. Each output object must follow this format:\n{}",
        base.trim_end(),
        shape.render()
    );

    if shape.has_list() {
        instruction.push_str(
            "\nIf an output field is a list, it must contain exactly the number of elements shown; \
             classify your output into the best element for each slot.",
        );
    }

    if shape.has_dynamic_keys() {
        instruction.push_str(
            "\nAny text enclosed by < and > describes content you must generate to replace it. \
             Any output key enclosed by < and > means you must generate the key name as well, \
             e.g. {\"<location>\": \"description of location\"} could become \
             {\"garden\": \"a place where plants grow\"}.",
        );
    }

    if let UserPrompts::Batch(inputs) = prompts {
        instruction.push_str(&format!(
            "\nYou will receive {n} inputs as a JSON array. Wrap all results in a single JSON array \
             containing exactly {n} objects, one per input, in the same order as the inputs.",
            n = inputs.len()
        ));
    }

    if let Some(reason) = prior_failure {
        instruction.push_str(&format!(
            "\n\n{} {}\nFix this and respond again.",
            RETRY_PREAMBLE, reason
        ));
    }

    instruction
}

/// Checks parsed output against the prompt form and shape, then converts
/// every record into `T`.
pub fn validate_output<T: DeserializeOwned>(
    value: Value,
    shape: &OutputShape,
    prompts: &UserPrompts,
) -> Result<Extracted<T>, String> {
    let records = match (value, prompts) {
        (Value::Array(items), UserPrompts::Batch(inputs)) => {
            if items.len() != inputs.len() {
                return Err(format!(
                    "expected a JSON array with {} objects (one per input), got {}",
                    inputs.len(),
                    items.len()
                ));
            }
            items
        }
        (object @ Value::Object(_), UserPrompts::Batch(inputs)) if inputs.len() == 1 => vec![object],
        (_, UserPrompts::Batch(inputs)) => {
            return Err(format!(
                "expected a JSON array with {} objects (one per input), got a single value",
                inputs.len()
            ));
        }
        (Value::Array(items), UserPrompts::Single(_)) => items,
        (other, UserPrompts::Single(_)) => vec![other],
    };

    let label = |index: usize, reason: String| {
        if prompts.is_batch() {
            format!("object {}: {}", index, reason)
        } else {
            reason
        }
    };

    let mut typed = Vec::with_capacity(records.len());
    for (index, mut record) in records.into_iter().enumerate() {
        shape.validate_record(&record).map_err(|r| label(index, r))?;
        if let Value::Object(map) = &mut record {
            stringify_literals(shape, map);
        }
        let item = serde_json::from_value::<T>(record).map_err(|e| label(index, e.to_string()))?;
        typed.push(item);
    }

    match prompts {
        UserPrompts::Batch(_) => Ok(Extracted::Many(typed)),
        UserPrompts::Single(_) => typed
            .into_iter()
            .next()
            .map(Extracted::One)
            .ok_or_else(|| "response contained no JSON object".to_string()),
    }
}

/// Turns an unreliable text-completion channel into typed records by
/// retrying with the previous failure fed back to the model.
pub struct StructuredExtractor {
    provider: Arc<dyn CompletionProvider>,
}

impl StructuredExtractor {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub async fn extract<T: DeserializeOwned>(
        &self,
        system_prompt: &str,
        prompts: &UserPrompts,
        shape: &OutputShape,
        options: &ExtractOptions,
    ) -> Result<Extracted<T>, ExtractionError> {
        let max_attempts = options.max_attempts.max(1);
        let user_content = prompts.user_content();
        let mut prior_failure: Option<String> = None;

        for number in 1..=max_attempts {
            let attempt = ExtractionAttempt {
                number,
                request: CompletionRequest {
                    system: build_system_instruction(
                        system_prompt,
                        shape,
                        prompts,
                        prior_failure.as_deref(),
                    ),
                    user: user_content.clone(),
                    model: options.model.clone(),
                    temperature: options.temperature,
                },
            };

            match self.run_attempt(attempt, shape, prompts, options).await {
                Ok(extracted) => {
                    log::info!("Extraction succeeded on attempt {}/{}", number, max_attempts);
                    return Ok(extracted);
                }
                Err(AttemptError::Provider(err)) => {
                    if number == max_attempts {
                        log::error!("Extraction attempt {} hit a provider error: {}", number, err);
                        return Err(ExtractionError::Provider(err));
                    }
                    log::warn!(
                        "Extraction attempt {}/{} hit a provider error, retrying: {}",
                        number,
                        max_attempts,
                        err
                    );
                }
                Err(AttemptError::Rejected(reason)) => {
                    log::warn!(
                        "Extraction attempt {}/{} rejected: {}",
                        number,
                        max_attempts,
                        reason
                    );
                    prior_failure = Some(reason);
                }
            }
        }

        Err(ExtractionError::Failed {
            attempts: max_attempts,
            last_reason: prior_failure
                .unwrap_or_else(|| "no valid response was produced".to_string()),
        })
    }

    async fn run_attempt<T: DeserializeOwned>(
        &self,
        attempt: ExtractionAttempt,
        shape: &OutputShape,
        prompts: &UserPrompts,
        options: &ExtractOptions,
    ) -> Result<Extracted<T>, AttemptError> {
        log::debug!("Starting extraction attempt {}", attempt.number);

        let raw = tokio::time::timeout(options.timeout, self.provider.complete(attempt.request))
            .await
            .map_err(|_| AttemptError::Provider(ProviderError::Timeout(options.timeout.as_secs())))?
            .map_err(AttemptError::Provider)?;

        let raw = raw.ok_or_else(|| AttemptError::Rejected("no content".to_string()))?;
        let value = repair_and_parse(&raw).map_err(|e| AttemptError::Rejected(e.0))?;

        validate_output(value, shape, prompts).map_err(AttemptError::Rejected)
    }
}

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    constants::quiz_prompt::TRANSLATION_PROMPT,
    models::domain::Question,
    services::completion_provider::{CompletionProvider, CompletionRequest},
};

/// Best-effort translation. Implementations never fail: on any problem they
/// return the input unchanged.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> String;
}

/// Leaves text untouched. Used when translation is not configured.
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, text: &str, _target_language: &str) -> String {
        text.to_string()
    }
}

/// Translates by asking the completion provider.
pub struct CompletionTranslator {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    timeout: Duration,
}

impl CompletionTranslator {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Translator for CompletionTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> String {
        if text.trim().is_empty() {
            return text.to_string();
        }

        let request = CompletionRequest {
            system: TRANSLATION_PROMPT.replace("{language}", target_language),
            user: text.to_string(),
            model: self.model.clone(),
            temperature: 0.0,
        };

        match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(Some(translated))) if !translated.trim().is_empty() => translated.trim().to_string(),
            Ok(Ok(_)) => {
                log::warn!("Translation to '{}' returned no text; keeping original", target_language);
                text.to_string()
            }
            Ok(Err(e)) => {
                log::warn!("Translation to '{}' failed; keeping original: {}", target_language, e);
                text.to_string()
            }
            Err(_) => {
                log::warn!(
                    "Translation to '{}' timed out after {}s; keeping original",
                    target_language,
                    self.timeout.as_secs()
                );
                text.to_string()
            }
        }
    }
}

/// Translates a question in place, keeping its structure: an MCQ answer is
/// re-pointed at the translated option in the same position.
pub async fn translate_question(translator: &dyn Translator, question: &mut Question, language: &str) {
    question.question = translator.translate(&question.question, language).await;

    match question.options.as_mut() {
        Some(options) => {
            let answer_index = options.iter().position(|o| *o == question.answer);
            for option in options.iter_mut() {
                *option = translator.translate(option, language).await;
            }
            question.answer = match answer_index {
                Some(index) => options[index].clone(),
                None => translator.translate(&question.answer, language).await,
            };
        }
        None => {
            question.answer = translator.translate(&question.answer, language).await;
        }
    }
}

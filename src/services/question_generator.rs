use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;

use crate::{
    constants::quiz_prompt::{
        mcq_user_prompt, open_ended_user_prompt, MCQ_SYSTEM_PROMPT, OPEN_ENDED_SYSTEM_PROMPT,
    },
    errors::{AppResult, QuestionValidationFailed},
    models::domain::{GameType, Question},
    services::{
        extraction::{ExtractOptions, Field, OutputShape, StructuredExtractor, UserPrompts},
        grading_service::{normalize_choice, resolve_answer, strip_option_prefix},
        translation_service::{translate_question, Translator},
    },
};

pub const MCQ_OPTION_COUNT: usize = 4;

#[derive(Debug, Deserialize)]
struct GeneratedMcq {
    question: String,
    answer: String,
    options: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedOpenEnded {
    question: String,
    answer: String,
}

pub fn mcq_shape() -> OutputShape {
    OutputShape::new()
        .field("question", Field::literal("question"))
        .field("answer", Field::literal("answer with max length of 15 words"))
        .field(
            "options",
            Field::list(MCQ_OPTION_COUNT, "option with max length of 15 words"),
        )
}

pub fn open_ended_shape() -> OutputShape {
    OutputShape::new()
        .field("question", Field::literal("question"))
        .field("answer", Field::literal("answer with max length of 15 words"))
}

/// Cleans up a generated MCQ: options lose their letter labels, must be
/// distinct, and the answer is rewritten to the exact text of the option it
/// resolves to.
fn validate_mcq(index: usize, raw: GeneratedMcq) -> Result<(String, String, Vec<String>), QuestionValidationFailed> {
    let fail = |reason: String| QuestionValidationFailed { index, reason };

    if raw.question.trim().is_empty() {
        return Err(fail("question text is empty".to_string()));
    }
    if raw.options.len() != MCQ_OPTION_COUNT {
        return Err(fail(format!(
            "expected {} options, got {}",
            MCQ_OPTION_COUNT,
            raw.options.len()
        )));
    }

    let options: Vec<String> = raw
        .options
        .iter()
        .map(|o| strip_option_prefix(o.trim()).trim().to_string())
        .collect();

    let mut seen = HashSet::new();
    for option in &options {
        if option.is_empty() {
            return Err(fail("an option is empty".to_string()));
        }
        if !seen.insert(normalize_choice(option)) {
            return Err(fail(format!("duplicate option `{}`", option)));
        }
    }

    let answer_index = resolve_answer(&options, &raw.answer)
        .ok_or_else(|| fail(format!("answer `{}` does not match any option", raw.answer.trim())))?;
    let answer = options[answer_index].clone();

    Ok((raw.question.trim().to_string(), answer, options))
}

fn validate_open_ended(index: usize, raw: GeneratedOpenEnded) -> Result<(String, String), QuestionValidationFailed> {
    let question = raw.question.trim();
    let answer = raw.answer.trim();
    if question.is_empty() || answer.is_empty() {
        return Err(QuestionValidationFailed {
            index,
            reason: "question and answer must both be non-empty".to_string(),
        });
    }
    Ok((question.to_string(), answer.to_string()))
}

/// Produces the questions for a new game: one batch extraction with a prompt
/// per question, validation, then optional translation.
pub struct QuestionGenerator {
    extractor: StructuredExtractor,
    translator: Arc<dyn Translator>,
    options: ExtractOptions,
    default_language: String,
}

impl QuestionGenerator {
    pub fn new(
        extractor: StructuredExtractor,
        translator: Arc<dyn Translator>,
        options: ExtractOptions,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            extractor,
            translator,
            options,
            default_language: default_language.into(),
        }
    }

    pub async fn generate(
        &self,
        game_id: &str,
        topic: &str,
        amount: usize,
        game_type: GameType,
        language: &str,
    ) -> AppResult<Vec<Question>> {
        let mut questions = match game_type {
            GameType::Mcq => self.generate_mcq(game_id, topic, amount).await?,
            GameType::OpenEnded => self.generate_open_ended(game_id, topic, amount).await?,
        };

        if !language.eq_ignore_ascii_case(&self.default_language) {
            log::info!("Translating {} questions into '{}'", questions.len(), language);
            for question in questions.iter_mut() {
                translate_question(self.translator.as_ref(), question, language).await;
            }
        }

        Ok(questions)
    }

    async fn generate_mcq(&self, game_id: &str, topic: &str, amount: usize) -> AppResult<Vec<Question>> {
        let prompts = UserPrompts::Batch(vec![mcq_user_prompt(topic); amount]);
        let generated = self
            .extractor
            .extract::<GeneratedMcq>(MCQ_SYSTEM_PROMPT, &prompts, &mcq_shape(), &self.options)
            .await?
            .into_vec();

        generated
            .into_iter()
            .enumerate()
            .map(|(index, raw)| -> AppResult<Question> {
                let (question, answer, options) = validate_mcq(index, raw)?;
                Ok(Question::new_mcq(game_id, &question, &answer, options))
            })
            .collect()
    }

    async fn generate_open_ended(&self, game_id: &str, topic: &str, amount: usize) -> AppResult<Vec<Question>> {
        let prompts = UserPrompts::Batch(vec![open_ended_user_prompt(topic); amount]);
        let generated = self
            .extractor
            .extract::<GeneratedOpenEnded>(OPEN_ENDED_SYSTEM_PROMPT, &prompts, &open_ended_shape(), &self.options)
            .await?
            .into_vec();

        generated
            .into_iter()
            .enumerate()
            .map(|(index, raw)| -> AppResult<Question> {
                let (question, answer) = validate_open_ended(index, raw)?;
                Ok(Question::new_open_ended(game_id, &question, &answer))
            })
            .collect()
    }
}

use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{Game, GameType, Question};
use crate::services::blank_selector::blank_answer;

/// A question as shown to the player while the game is running. The answer
/// is never included; open-ended questions carry the blanked answer instead.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuestionDto {
    pub id: String,
    pub question: String,
    pub question_type: GameType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blanked_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blank_count: Option<i32>,
    pub answered: bool,
}

impl From<&Question> for QuestionDto {
    fn from(question: &Question) -> Self {
        let blanked = match question.question_type {
            GameType::OpenEnded => Some(blank_answer(&question.answer)),
            GameType::Mcq => None,
        };

        QuestionDto {
            id: question.id.clone(),
            question: question.question.clone(),
            question_type: question.question_type,
            options: question.options.clone(),
            blank_count: blanked.as_ref().map(|b| b.blank_count as i32),
            blanked_answer: blanked.map(|b| b.text),
            answered: question.is_answered(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct GameDto {
    pub id: String,
    pub user_id: String,
    pub topic: String,
    pub game_type: GameType,
    pub language: String,
    pub time_started: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ended: Option<DateTime<Utc>>,
    pub questions: Vec<QuestionDto>,
}

impl From<&Game> for GameDto {
    fn from(game: &Game) -> Self {
        GameDto {
            id: game.id.clone(),
            user_id: game.user_id.clone(),
            topic: game.topic.clone(),
            game_type: game.game_type,
            language: game.language.clone(),
            time_started: game.time_started,
            time_ended: game.time_ended,
            questions: game.questions.iter().map(QuestionDto::from).collect(),
        }
    }
}

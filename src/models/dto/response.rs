use async_graphql::SimpleObject;
use serde::Serialize;

use crate::models::domain::{GameType, Question};

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct CheckAnswerResponse {
    pub question_id: String,
    /// Set for multiple choice questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    /// Set for open-ended questions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_similar: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_enough: Option<bool>,
    pub answered: i32,
    pub total: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question_index: Option<i32>,
    pub game_completed: bool,
}

/// A question after the fact, with the answer revealed.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuestionResultDto {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_correct: Option<i32>,
}

impl From<&Question> for QuestionResultDto {
    fn from(question: &Question) -> Self {
        QuestionResultDto {
            question_id: question.id.clone(),
            question: question.question.clone(),
            answer: question.answer.clone(),
            options: question.options.clone(),
            user_answer: question.user_answer.clone(),
            is_correct: question.is_correct,
            percentage_correct: question.percentage_correct.map(i32::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct GameStatistics {
    pub game_id: String,
    pub topic: String,
    pub game_type: GameType,
    pub accuracy: f64,
    pub completed: bool,
    /// Seconds between start and end; absent while the game is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_secs: Option<i64>,
    pub questions: Vec<QuestionResultDto>,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct PlayerStatistics {
    pub user_id: String,
    pub games_played: i32,
    pub games_completed: i32,
    pub questions_answered: i32,
    /// Mean accuracy over completed games, rounded to two decimals.
    pub average_accuracy: f64,
    pub mcq_games: i32,
    pub open_ended_games: i32,
}

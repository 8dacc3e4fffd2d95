use async_graphql::Enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Mcq,       // Four options, one correct
    OpenEnded, // Free text, graded by similarity
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub game_id: String,
    pub question: String,
    pub answer: String,
    pub question_type: GameType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>, // Mcq only, exactly four
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>, // Mcq only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_correct: Option<u8>, // OpenEnded only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new_mcq(game_id: &str, question: &str, answer: &str, options: Vec<String>) -> Self {
        Self::new(game_id, question, answer, GameType::Mcq, Some(options))
    }

    pub fn new_open_ended(game_id: &str, question: &str, answer: &str) -> Self {
        Self::new(game_id, question, answer, GameType::OpenEnded, None)
    }

    fn new(
        game_id: &str,
        question: &str,
        answer: &str,
        question_type: GameType,
        options: Option<Vec<String>>,
    ) -> Self {
        let now = Utc::now();
        Question {
            id: Uuid::new_v4().to_string(),
            game_id: game_id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            question_type,
            options,
            user_answer: None,
            is_correct: None,
            percentage_correct: None,
            created_at: Some(now),
            modified_at: Some(now),
        }
    }

    pub fn is_answered(&self) -> bool {
        self.user_answer.is_some()
    }
}

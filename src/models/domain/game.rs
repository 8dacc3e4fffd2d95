use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::question::{GameType, Question};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Game {
    pub id: String,
    pub user_id: String, // Player who requested the game
    pub topic: String,
    pub game_type: GameType,
    pub language: String, // Language the questions are stored in
    pub time_started: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ended: Option<DateTime<Utc>>, // Set once, on completion or explicit end
    pub questions: Vec<Question>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Game {
    pub fn new(user_id: &str, topic: &str, game_type: GameType, language: &str) -> Self {
        let now = Utc::now();
        Game {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            topic: topic.to_string(),
            game_type,
            language: language.to_string(),
            time_started: now,
            time_ended: None,
            questions: Vec::new(),
            created_at: Some(now),
            modified_at: Some(now),
        }
    }

    pub fn is_ended(&self) -> bool {
        self.time_ended.is_some()
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_answered()).count()
    }

    pub fn all_answered(&self) -> bool {
        !self.questions.is_empty() && self.answered_count() == self.questions.len()
    }

    /// Index of the first question still waiting for an answer.
    pub fn next_question_index(&self) -> Option<usize> {
        self.questions.iter().position(|q| !q.is_answered())
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn question_mut(&mut self, question_id: &str) -> Option<&mut Question> {
        self.questions.iter_mut().find(|q| q.id == question_id)
    }
}

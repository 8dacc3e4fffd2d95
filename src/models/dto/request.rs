use async_graphql::InputObject;
use serde::Deserialize;
use validator::Validate;

use crate::models::domain::GameType;

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,

    #[validate(length(min = 4, max = 50, message = "Topic must be between 4 and 50 characters"))]
    pub topic: String,

    #[validate(range(min = 1, max = 10, message = "Amount must be between 1 and 10"))]
    pub amount: i32,

    pub game_type: GameType,

    /// Language code for the questions; defaults to the server's language.
    #[validate(length(min = 2, max = 10))]
    pub language: Option<String>,
}

/// Either a free-text answer or, for open-ended questions, the words typed
/// into the blanks.
#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct CheckAnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,

    #[validate(length(max = 1000))]
    pub user_answer: Option<String>,

    pub blank_inputs: Option<Vec<String>>,
}

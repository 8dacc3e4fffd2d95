use crate::models::domain::{Game, GameType, Question};

#[cfg(test)]
pub mod fixtures {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use tokio::sync::RwLock;

    use super::*;
    use crate::app_state::AppState;
    use crate::config::Config;
    use crate::errors::{AppError, AppResult, ProviderError};
    use crate::repositories::GameRepository;
    use crate::services::completion_provider::{CompletionProvider, CompletionRequest};
    use crate::services::extraction::{ExtractOptions, StructuredExtractor};
    use crate::services::game_service::GameService;
    use crate::services::question_generator::QuestionGenerator;
    use crate::services::translation_service::{PassthroughTranslator, Translator};

    type Reply = Result<Option<String>, ProviderError>;

    /// Replays canned replies in order and records every request it saw.
    pub struct ScriptedProvider {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        pub fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| Ok(Some(t.to_string()))).collect())
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> Reply {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Unavailable("script exhausted".to_string())))
        }
    }

    /// Prefixes text with the target language, e.g. "[fr] Hello".
    pub struct TaggingTranslator;

    #[async_trait]
    impl Translator for TaggingTranslator {
        async fn translate(&self, text: &str, target_language: &str) -> String {
            format!("[{}] {}", target_language, text)
        }
    }

    /// A batch of well-formed MCQ records whose answer is always the first
    /// option.
    pub fn mcq_batch_json(count: usize) -> String {
        let records: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "question": format!("Which pigment absorbs light, variant {}?", i),
                    "answer": format!("Chlorophyll {}", i),
                    "options": [
                        format!("Chlorophyll {}", i),
                        format!("Keratin {}", i),
                        format!("Melanin {}", i),
                        format!("Hemoglobin {}", i),
                    ],
                })
            })
            .collect();
        serde_json::Value::Array(records).to_string()
    }

    pub fn open_ended_batch_json(count: usize) -> String {
        let records: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "question": format!("What does chlorophyll do, variant {}?", i),
                    "answer": format!("Chlorophyll absorbs sunlight for photosynthesis {}", i),
                })
            })
            .collect();
        serde_json::Value::Array(records).to_string()
    }

    pub fn mcq_game(user_id: &str, count: usize) -> Game {
        let mut game = Game::new(user_id, "Photosynthesis", GameType::Mcq, "en");
        game.questions = (0..count)
            .map(|i| {
                Question::new_mcq(
                    &game.id,
                    &format!("Question {}", i),
                    "Chlorophyll",
                    vec![
                        "Chlorophyll".to_string(),
                        "Keratin".to_string(),
                        "Melanin".to_string(),
                        "Hemoglobin".to_string(),
                    ],
                )
            })
            .collect();
        game
    }

    pub fn open_ended_game(user_id: &str, count: usize) -> Game {
        let mut game = Game::new(user_id, "Photosynthesis", GameType::OpenEnded, "en");
        game.questions = (0..count)
            .map(|i| {
                Question::new_open_ended(
                    &game.id,
                    &format!("Question {}", i),
                    "Plants use chlorophyll to capture sunlight energy",
                )
            })
            .collect();
        game
    }

    /// App state over an in-memory repository and a scripted provider.
    pub fn test_state(repo: Arc<InMemoryGameRepository>, provider: Arc<ScriptedProvider>) -> AppState {
        let config = Config::test_config();
        let generator = QuestionGenerator::new(
            StructuredExtractor::new(provider),
            Arc::new(PassthroughTranslator),
            ExtractOptions::from_config(&config),
            config.default_language.clone(),
        );
        let game_service = GameService::new(repo, generator, config.default_language.clone());
        AppState::from_parts(Arc::new(game_service), config)
    }

    pub struct InMemoryGameRepository {
        games: Arc<RwLock<HashMap<String, Game>>>,
        reachable: bool,
    }

    impl InMemoryGameRepository {
        pub fn new() -> Self {
            Self {
                games: Arc::new(RwLock::new(HashMap::new())),
                reachable: true,
            }
        }

        /// A store whose ping always fails.
        pub fn unreachable() -> Self {
            Self {
                reachable: false,
                ..Self::new()
            }
        }

        pub async fn with_games(games: Vec<Game>) -> Self {
            let repo = Self::new();
            {
                let mut stored = repo.games.write().await;
                for game in games {
                    stored.insert(game.id.clone(), game);
                }
            }
            repo
        }
    }

    #[async_trait]
    impl GameRepository for InMemoryGameRepository {
        async fn create(&self, game: Game) -> AppResult<Game> {
            self.games.write().await.insert(game.id.clone(), game.clone());
            Ok(game)
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<Game>> {
            Ok(self.games.read().await.get(id).cloned())
        }

        async fn find_by_question_id(&self, question_id: &str) -> AppResult<Option<Game>> {
            let games = self.games.read().await;
            Ok(games
                .values()
                .find(|g| g.question(question_id).is_some())
                .cloned())
        }

        async fn update_question(&self, game_id: &str, question: &Question) -> AppResult<()> {
            let mut games = self.games.write().await;
            let slot = games
                .get_mut(game_id)
                .and_then(|g| g.question_mut(&question.id))
                .ok_or_else(|| AppError::NotFound(format!("Question {}", question.id)))?;
            *slot = question.clone();
            Ok(())
        }

        async fn set_time_ended(&self, game_id: &str, time_ended: DateTime<Utc>) -> AppResult<bool> {
            let mut games = self.games.write().await;
            match games.get_mut(game_id) {
                Some(game) if game.time_ended.is_none() => {
                    game.time_ended = Some(time_ended);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Game>> {
            let games = self.games.read().await;
            let mut items: Vec<Game> = games
                .values()
                .filter(|g| g.user_id == user_id)
                .cloned()
                .collect();
            items.sort_by(|a, b| b.time_started.cmp(&a.time_started));
            Ok(items)
        }

        async fn ping(&self) -> AppResult<Duration> {
            if self.reachable {
                Ok(Duration::from_millis(1))
            } else {
                Err(AppError::DatabaseError("server selection timeout".to_string()))
            }
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::repositories::GameRepository;

    #[test]
    fn test_fixture_games_have_questions() {
        let game = mcq_game("p1", 3);
        assert_eq!(game.questions.len(), 3);
        assert!(game.questions.iter().all(|q| q.game_id == game.id));
    }

    #[tokio::test]
    async fn test_in_memory_repo_ends_game_once() {
        let game = open_ended_game("p1", 1);
        let id = game.id.clone();
        let repo = InMemoryGameRepository::with_games(vec![game]).await;

        assert!(repo.set_time_ended(&id, chrono::Utc::now()).await.unwrap());
        assert!(!repo.set_time_ended(&id, chrono::Utc::now()).await.unwrap());
    }
}

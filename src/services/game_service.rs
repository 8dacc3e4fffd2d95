use std::{sync::Arc, time::Duration};

use chrono::Utc;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{Game, GameType, Question},
        dto::{
            game_dto::GameDto,
            request::{CheckAnswerRequest, CreateGameRequest},
            response::{CheckAnswerResponse, GameStatistics, PlayerStatistics, QuestionResultDto},
        },
    },
    repositories::GameRepository,
    services::{
        blank_selector::blank_answer,
        grading_service::{GradingResult, GradingService},
        question_generator::QuestionGenerator,
    },
};

pub struct GameService {
    repository: Arc<dyn GameRepository>,
    generator: QuestionGenerator,
    default_language: String,
}

impl GameService {
    pub fn new(
        repository: Arc<dyn GameRepository>,
        generator: QuestionGenerator,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            generator,
            default_language: default_language.into(),
        }
    }

    /// Generates every question before anything is stored, so a failed
    /// generation leaves no partial game behind.
    pub async fn create_game(&self, mut request: CreateGameRequest) -> AppResult<GameDto> {
        request.user_id = request.user_id.trim().to_string();
        request.topic = request.topic.trim().to_string();
        request.validate()?;

        let topic = request.topic.as_str();
        let language = request
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.default_language.as_str())
            .to_lowercase();

        let mut game = Game::new(&request.user_id, topic, request.game_type, &language);
        log::info!(
            "Generating {} {:?} questions about '{}' for game {}",
            request.amount,
            request.game_type,
            topic,
            game.id
        );

        game.questions = self
            .generator
            .generate(&game.id, topic, request.amount as usize, request.game_type, &language)
            .await?;

        let game = self.repository.create(game).await?;
        log::info!("Created game {} with {} questions", game.id, game.questions.len());
        Ok(GameDto::from(&game))
    }

    pub async fn get_game(&self, id: &str) -> AppResult<GameDto> {
        let game = self.find_game(id).await?;
        Ok(GameDto::from(&game))
    }

    pub async fn check_answer(&self, request: CheckAnswerRequest) -> AppResult<CheckAnswerResponse> {
        request.validate()?;

        let mut game = self
            .repository
            .find_by_question_id(&request.question_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Question with id '{}' not found", request.question_id))
            })?;

        if game.is_ended() {
            return Err(AppError::ValidationError(format!(
                "Game '{}' has already ended",
                game.id
            )));
        }

        let (updated, result) = {
            let question = game.question_mut(&request.question_id).ok_or_else(|| {
                AppError::NotFound(format!("Question with id '{}' not found", request.question_id))
            })?;
            let submitted = submitted_answer(question, &request)?;
            let result = GradingService::grade_question(question, &submitted);
            GradingService::apply(question, &submitted, result);
            (question.clone(), result)
        };

        self.repository.update_question(&game.id, &updated).await?;

        let game_completed = game.all_answered();
        if game_completed && self.repository.set_time_ended(&game.id, Utc::now()).await? {
            log::info!("Game {} completed", game.id);
        }

        let (is_correct, percentage_similar, close_enough) = match result {
            GradingResult::Choice(grade) => (Some(grade.is_correct), None, None),
            GradingResult::OpenEnded(grade) => (
                None,
                Some(i32::from(grade.percentage_similar)),
                Some(grade.is_close_enough()),
            ),
        };

        Ok(CheckAnswerResponse {
            question_id: updated.id,
            is_correct,
            percentage_similar,
            close_enough,
            answered: game.answered_count() as i32,
            total: game.questions.len() as i32,
            next_question_index: game.next_question_index().map(|i| i as i32),
            game_completed,
        })
    }

    /// Ending an already ended game is a no-op.
    pub async fn end_game(&self, id: &str) -> AppResult<GameDto> {
        let game = self.find_game(id).await?;
        if game.is_ended() {
            return Ok(GameDto::from(&game));
        }

        if self.repository.set_time_ended(id, Utc::now()).await? {
            log::info!("Game {} ended by player", id);
        }

        let game = self.find_game(id).await?;
        Ok(GameDto::from(&game))
    }

    pub async fn game_statistics(&self, id: &str) -> AppResult<GameStatistics> {
        let game = self.find_game(id).await?;
        Ok(statistics_for(&game))
    }

    pub async fn player_statistics(&self, user_id: &str) -> AppResult<PlayerStatistics> {
        let games = self.repository.list_by_user(user_id).await?;

        let completed: Vec<&Game> = games.iter().filter(|g| g.is_ended()).collect();
        let average_accuracy = if completed.is_empty() {
            0.0
        } else {
            let total: f64 = completed.iter().map(|g| GradingService::accuracy(g)).sum();
            (total / completed.len() as f64 * 100.0).round() / 100.0
        };

        Ok(PlayerStatistics {
            user_id: user_id.to_string(),
            games_played: games.len() as i32,
            games_completed: completed.len() as i32,
            questions_answered: games.iter().map(|g| g.answered_count() as i32).sum(),
            average_accuracy,
            mcq_games: games.iter().filter(|g| g.game_type == GameType::Mcq).count() as i32,
            open_ended_games: games
                .iter()
                .filter(|g| g.game_type == GameType::OpenEnded)
                .count() as i32,
        })
    }

    /// Round-trip time to the game store.
    pub async fn storage_latency(&self) -> AppResult<Duration> {
        self.repository.ping().await
    }

    async fn find_game(&self, id: &str) -> AppResult<Game> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Game with id '{}' not found", id)))
    }
}

/// Resolves what the player submitted: free text wins, otherwise blank
/// inputs are filled back into the blanked answer.
fn submitted_answer(question: &Question, request: &CheckAnswerRequest) -> AppResult<String> {
    match (&request.user_answer, &request.blank_inputs) {
        (Some(answer), _) => Ok(answer.clone()),
        (None, Some(inputs)) if question.question_type == GameType::OpenEnded => {
            Ok(blank_answer(&question.answer).fill(inputs.as_slice()))
        }
        (None, Some(_)) => Err(AppError::ValidationError(
            "Blank inputs are only accepted for open-ended questions".to_string(),
        )),
        (None, None) => Err(AppError::ValidationError(
            "Either user_answer or blank_inputs is required".to_string(),
        )),
    }
}

fn statistics_for(game: &Game) -> GameStatistics {
    GameStatistics {
        game_id: game.id.clone(),
        topic: game.topic.clone(),
        game_type: game.game_type,
        accuracy: GradingService::accuracy(game),
        completed: game.is_ended(),
        time_taken_secs: game
            .time_ended
            .map(|ended| (ended - game.time_started).num_seconds()),
        questions: game.questions.iter().map(QuestionResultDto::from).collect(),
    }
}

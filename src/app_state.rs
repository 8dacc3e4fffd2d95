use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::MongoGameRepository,
    services::{
        completion_provider::{CompletionProvider, OpenAiProvider},
        extraction::{ExtractOptions, StructuredExtractor},
        game_service::GameService,
        question_generator::QuestionGenerator,
        translation_service::CompletionTranslator,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub game_service: Arc<GameService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config, db: &Database) -> AppResult<Self> {
        let game_repository = Arc::new(MongoGameRepository::new(db));
        game_repository.ensure_indexes().await?;

        let provider: Arc<dyn CompletionProvider> = Arc::new(OpenAiProvider::new(&config));
        let translator = Arc::new(CompletionTranslator::new(
            provider.clone(),
            config.openai_model.clone(),
            config.provider_timeout(),
        ));
        let generator = QuestionGenerator::new(
            StructuredExtractor::new(provider),
            translator,
            ExtractOptions::from_config(&config),
            config.default_language.clone(),
        );

        let game_service = Arc::new(GameService::new(
            game_repository,
            generator,
            config.default_language.clone(),
        ));

        Ok(Self::from_parts(game_service, config))
    }

    pub fn from_parts(game_service: Arc<GameService>, config: Config) -> Self {
        Self {
            game_service,
            config: Arc::new(config),
        }
    }
}

use async_trait::async_trait;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::{FindOptions, IndexOptions},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{Game, Question},
};

/// Games are stored whole, with their questions embedded.
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn create(&self, game: Game) -> AppResult<Game>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Game>>;
    async fn find_by_question_id(&self, question_id: &str) -> AppResult<Option<Game>>;
    /// Replaces one embedded question, matched by its id.
    async fn update_question(&self, game_id: &str, question: &Question) -> AppResult<()>;
    /// Sets `time_ended` unless it is already set. Returns whether it changed.
    async fn set_time_ended(&self, game_id: &str, time_ended: DateTime<Utc>) -> AppResult<bool>;
    /// Most recent first.
    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Game>>;
    /// Round-trip to the backing store, for readiness checks.
    async fn ping(&self) -> AppResult<Duration> {
        Ok(Duration::ZERO)
    }
}

pub struct MongoGameRepository {
    db: Database,
    collection: Collection<Game>,
}

impl MongoGameRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            collection: db.games(),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for games collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let question_index = IndexModel::builder()
            .keys(doc! { "questions.id": 1 })
            .options(IndexOptions::builder().name("question_id".to_string()).build())
            .build();

        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "time_started": -1 })
            .options(IndexOptions::builder().name("user_recent".to_string()).build())
            .build();

        self.collection
            .create_indexes(vec![id_index, question_index, user_index])
            .await?;

        log::info!("Successfully created indexes for games collection");
        Ok(())
    }
}

#[async_trait]
impl GameRepository for MongoGameRepository {
    async fn create(&self, game: Game) -> AppResult<Game> {
        self.collection.insert_one(&game).await?;
        Ok(game)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Game>> {
        let game = self.collection.find_one(doc! { "id": id }).await?;
        Ok(game)
    }

    async fn find_by_question_id(&self, question_id: &str) -> AppResult<Option<Game>> {
        let game = self
            .collection
            .find_one(doc! { "questions.id": question_id })
            .await?;
        Ok(game)
    }

    async fn update_question(&self, game_id: &str, question: &Question) -> AppResult<()> {
        let result = self
            .collection
            .update_one(
                doc! { "id": game_id, "questions.id": &question.id },
                doc! { "$set": {
                    "questions.$": to_bson(question)?,
                    "modified_at": to_bson(&Utc::now())?,
                } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Question {} in game {}",
                question.id, game_id
            )));
        }
        Ok(())
    }

    async fn set_time_ended(&self, game_id: &str, time_ended: DateTime<Utc>) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": game_id, "time_ended": { "$exists": false } },
                doc! { "$set": {
                    "time_ended": to_bson(&time_ended)?,
                    "modified_at": to_bson(&time_ended)?,
                } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Game>> {
        let find_options = FindOptions::builder()
            .sort(doc! { "time_started": -1 })
            .build();

        let cursor = self
            .collection
            .find(doc! { "user_id": user_id })
            .with_options(find_options)
            .await?;
        let games: Vec<Game> = cursor.try_collect().await?;
        Ok(games)
    }

    async fn ping(&self) -> AppResult<Duration> {
        self.db.ping().await
    }
}

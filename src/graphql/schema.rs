use async_graphql::{Context, EmptySubscription, ErrorExtensions, Object, Result, Schema as GraphQLSchema, ID};

use crate::{
    app_state::AppState,
    models::dto::{
        game_dto::GameDto,
        request::{CheckAnswerRequest, CreateGameRequest},
        response::{CheckAnswerResponse, GameStatistics, PlayerStatistics},
    },
};

pub type Schema = GraphQLSchema<QueryRoot, MutationRoot, EmptySubscription>;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn game(&self, ctx: &Context<'_>, id: ID) -> Result<GameDto> {
        let state = ctx.data::<AppState>()?;
        state.game_service.get_game(&id).await.map_err(|e| e.extend())
    }

    async fn game_statistics(&self, ctx: &Context<'_>, id: ID) -> Result<GameStatistics> {
        let state = ctx.data::<AppState>()?;
        state
            .game_service
            .game_statistics(&id)
            .await
            .map_err(|e| e.extend())
    }

    async fn player_statistics(&self, ctx: &Context<'_>, user_id: String) -> Result<PlayerStatistics> {
        let state = ctx.data::<AppState>()?;
        state
            .game_service
            .player_statistics(&user_id)
            .await
            .map_err(|e| e.extend())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_game(&self, ctx: &Context<'_>, input: CreateGameRequest) -> Result<GameDto> {
        let state = ctx.data::<AppState>()?;
        state.game_service.create_game(input).await.map_err(|e| e.extend())
    }

    async fn check_answer(&self, ctx: &Context<'_>, input: CheckAnswerRequest) -> Result<CheckAnswerResponse> {
        let state = ctx.data::<AppState>()?;
        state.game_service.check_answer(input).await.map_err(|e| e.extend())
    }

    async fn end_game(&self, ctx: &Context<'_>, id: ID) -> Result<GameDto> {
        let state = ctx.data::<AppState>()?;
        state.game_service.end_game(&id).await.map_err(|e| e.extend())
    }
}

pub fn create_schema(app_state: AppState) -> Schema {
    GraphQLSchema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(app_state)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{mcq_game, test_state, InMemoryGameRepository, ScriptedProvider};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_schema_exposes_game_operations() {
        let sdl = create_schema(test_state(
            Arc::new(InMemoryGameRepository::new()),
            Arc::new(ScriptedProvider::new(vec![])),
        ))
        .sdl();

        for field in ["gameStatistics", "playerStatistics", "createGame", "checkAnswer", "endGame"] {
            assert!(sdl.contains(field), "schema is missing {}", field);
        }
    }

    #[tokio::test]
    async fn test_check_answer_mutation() {
        let game = mcq_game("player-1", 1);
        let question_id = game.questions[0].id.clone();
        let repo = Arc::new(InMemoryGameRepository::with_games(vec![game]).await);
        let schema = create_schema(test_state(repo, Arc::new(ScriptedProvider::new(vec![]))));

        let query = format!(
            r#"mutation {{ checkAnswer(input: {{ questionId: "{}", userAnswer: "B. Keratin" }}) {{ isCorrect gameCompleted }} }}"#,
            question_id
        );
        let response = schema.execute(query).await;

        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["checkAnswer"]["isCorrect"], false);
        assert_eq!(data["checkAnswer"]["gameCompleted"], true);
    }

    #[tokio::test]
    async fn test_missing_game_carries_error_code() {
        let schema = create_schema(test_state(
            Arc::new(InMemoryGameRepository::new()),
            Arc::new(ScriptedProvider::new(vec![])),
        ));

        let response = schema.execute(r#"{ game(id: "missing") { id } }"#).await;

        assert_eq!(response.errors.len(), 1);
        let extensions = response.errors[0].extensions.as_ref().unwrap();
        assert_eq!(
            extensions.get("code"),
            Some(&async_graphql::Value::from("NOT_FOUND"))
        );
    }
}

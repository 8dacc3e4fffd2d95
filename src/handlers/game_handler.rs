use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};

use crate::{app_state::AppState, errors::AppError, models::dto::request::CreateGameRequest};

#[post("/api/games")]
pub async fn create_game(
    state: web::Data<Arc<AppState>>,
    request: web::Json<CreateGameRequest>,
) -> Result<HttpResponse, AppError> {
    let game = state.game_service.create_game(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(game))
}

#[get("/api/games/{id}")]
pub async fn get_game(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let game = state.game_service.get_game(&id).await?;
    Ok(HttpResponse::Ok().json(game))
}

#[post("/api/games/{id}/end")]
pub async fn end_game(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let game = state.game_service.end_game(&id).await?;
    Ok(HttpResponse::Ok().json(game))
}

#[get("/api/games/{id}/statistics")]
pub async fn game_statistics(
    state: web::Data<Arc<AppState>>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let stats = state.game_service.game_statistics(&id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/api/players/{user_id}/statistics")]
pub async fn player_statistics(
    state: web::Data<Arc<AppState>>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let stats = state.game_service.player_statistics(&user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

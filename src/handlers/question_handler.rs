use std::sync::Arc;

use actix_web::{post, web, HttpResponse};

use crate::{app_state::AppState, errors::AppError, models::dto::request::CheckAnswerRequest};

#[post("/api/questions/check-answer")]
pub async fn check_answer(
    state: web::Data<Arc<AppState>>,
    request: web::Json<CheckAnswerRequest>,
) -> Result<HttpResponse, AppError> {
    let response = state.game_service.check_answer(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

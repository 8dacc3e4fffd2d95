use std::sync::Arc;

use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::app_state::AppState;

/// Service identity: which model generates questions and the language games
/// default to.
#[get("/health")]
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.config.openai_model,
        "default_language": state.config.default_language,
    }))
}

/// Ready once the game store answers a ping. Question generation is not
/// probed here since every call to the provider is billed.
#[get("/health/ready")]
pub async fn health_check_ready(state: web::Data<Arc<AppState>>) -> HttpResponse {
    match state.game_service.storage_latency().await {
        Ok(latency) => HttpResponse::Ok().json(json!({
            "status": "ready",
            "game_store": { "status": "ok", "latency_ms": latency.as_millis() as u64 },
        })),
        Err(e) => {
            log::warn!("Game store unreachable during readiness check: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "not_ready",
                "game_store": { "status": "error", "error_code": e.error_code() },
            }))
        }
    }
}

#[get("/health/live")]
pub async fn health_check_live() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "alive" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{test_state, InMemoryGameRepository, ScriptedProvider};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    fn state(repo: InMemoryGameRepository) -> web::Data<Arc<AppState>> {
        web::Data::new(Arc::new(test_state(
            Arc::new(repo),
            Arc::new(ScriptedProvider::new(vec![])),
        )))
    }

    #[actix_web::test]
    async fn test_health_check_reports_generation_settings() {
        let app = test::init_service(
            App::new()
                .app_data(state(InMemoryGameRepository::new()))
                .service(health_check),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["model"], "test-model");
        assert_eq!(body["default_language"], "en");
    }

    #[actix_web::test]
    async fn test_ready_when_game_store_answers() {
        let app = test::init_service(
            App::new()
                .app_data(state(InMemoryGameRepository::new()))
                .service(health_check_ready),
        )
        .await;

        let req = test::TestRequest::get().uri("/health/ready").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["game_store"]["status"], "ok");
    }

    #[actix_web::test]
    async fn test_not_ready_when_game_store_is_down() {
        let app = test::init_service(
            App::new()
                .app_data(state(InMemoryGameRepository::unreachable()))
                .service(health_check_ready),
        )
        .await;

        let req = test::TestRequest::get().uri("/health/ready").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["game_store"]["error_code"], "DATABASE_ERROR");
    }

    #[actix_web::test]
    async fn test_health_check_live() {
        let app = test::init_service(App::new().service(health_check_live)).await;

        let req = test::TestRequest::get().uri("/health/live").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "alive");
    }
}

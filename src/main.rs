use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use quizcraft_server::{
    app_state::AppState,
    config::Config,
    db::Database,
    graphql::create_schema,
    handlers::{self, graphql_handler},
    middleware::RequestIdMiddleware,
};

fn cors_for(config: &Config) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .max_age(3600);

    match &config.cors_allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors.allow_any_origin(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if config.is_production() {
        if let Err(e) = config.validate_for_production() {
            log::error!("Invalid production configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    }

    let db = Database::connect(&config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let bind_address = (config.web_server_host.clone(), config.web_server_port);
    let state = AppState::new(config, &db)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let schema = create_schema(state.clone());
    let config = Arc::clone(&state.config);
    let state = Arc::new(state);

    log::info!(
        "Starting HTTP server on {}:{} (model {}, GraphiQL at /graphql)",
        bind_address.0,
        bind_address.1,
        config.openai_model
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(schema.clone()))
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .wrap(cors_for(&config))
            .service(handlers::health_check)
            .service(handlers::health_check_ready)
            .service(handlers::health_check_live)
            .service(handlers::create_game)
            .service(handlers::get_game)
            .service(handlers::end_game)
            .service(handlers::game_statistics)
            .service(handlers::player_statistics)
            .service(handlers::check_answer)
            .configure(graphql_handler::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}

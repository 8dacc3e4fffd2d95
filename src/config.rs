use std::env;
use std::time::Duration;

use secrecy::SecretString;

use crate::errors::{AppError, AppResult};

const DEFAULT_OPENAI_KEY: &str = "openai_api_key";

#[derive(Clone, Debug)]
pub struct Config {
    pub app_env: String,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub games_collection: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub cors_allowed_origin: Option<String>,
    pub openai_api_key: SecretString,
    pub openai_api_base: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub extraction_max_attempts: u32,
    pub provider_timeout_secs: u64,
    pub default_language: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "quizcraft-local".to_string()),
            games_collection: env::var("GAMES_COLLECTION").unwrap_or_else(|_| "games".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
            openai_api_key: SecretString::from(
                env::var("OPENAI_API_KEY").unwrap_or_else(|_| DEFAULT_OPENAI_KEY.to_string()),
            ),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_temperature: env::var("OPENAI_TEMPERATURE")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(1.0),
            extraction_max_attempts: env::var("EXTRACTION_MAX_ATTEMPTS")
                .ok()
                .and_then(|a| a.parse().ok())
                .filter(|a: &u32| *a > 0)
                .unwrap_or(3),
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            default_language: env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "en".to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Rejects configuration that would only work on a developer machine.
    pub fn validate_for_production(&self) -> AppResult<()> {
        use secrecy::ExposeSecret;

        let api_key = self.openai_api_key.expose_secret();

        if api_key == DEFAULT_OPENAI_KEY || api_key.trim().is_empty() {
            return Err(AppError::ValidationError(
                "OPENAI_API_KEY is using its default value; set it to a real provider key".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.openai_temperature) {
            return Err(AppError::ValidationError(format!(
                "OPENAI_TEMPERATURE must be between 0 and 2, got {}",
                self.openai_temperature
            )));
        }

        if self.cors_allowed_origin.is_none() {
            return Err(AppError::ValidationError(
                "CORS_ALLOWED_ORIGIN must be set in production".to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            app_env: "test".to_string(),
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "quizcraft-test".to_string(),
            games_collection: "games".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            cors_allowed_origin: None,
            openai_api_key: SecretString::from("test-openai-key".to_string()),
            openai_api_base: "http://localhost:9999/v1".to_string(),
            openai_model: "test-model".to_string(),
            openai_temperature: 0.5,
            extraction_max_attempts: 3,
            provider_timeout_secs: 5,
            default_language: "en".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        assert!(!config.mongo_conn_string.is_empty());
        assert!(!config.mongo_db_name.is_empty());
        assert!(config.extraction_max_attempts > 0);
        assert!(!config.default_language.is_empty());
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.mongo_db_name, "quizcraft-test");
        assert_eq!(config.games_collection, "games");
        assert_eq!(config.extraction_max_attempts, 3);
        assert_eq!(config.provider_timeout(), Duration::from_secs(5));
        assert!(!config.is_production());
    }

    #[test]
    fn production_validation_rejects_default_key() {
        let mut config = Config::test_config();
        config.openai_api_key = SecretString::from(DEFAULT_OPENAI_KEY.to_string());
        config.cors_allowed_origin = Some("https://quiz.example.com".to_string());

        assert!(config.validate_for_production().is_err());
    }

    #[test]
    fn production_validation_accepts_complete_config() {
        let mut config = Config::test_config();
        config.cors_allowed_origin = Some("https://quiz.example.com".to_string());

        assert!(config.validate_for_production().is_ok());
    }
}

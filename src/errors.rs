use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use async_graphql::ErrorExtensions;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("{}", .0.user_message())]
    Provider(ProviderError),

    #[error("Question generation failed: {0}")]
    GenerationFailed(String),

    #[error("Generated questions were invalid: {0}")]
    InvalidQuestions(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Provider(err) => err.error_code(),
            AppError::GenerationFailed(_) => "GENERATION_FAILED",
            AppError::InvalidQuestions(_) => "INVALID_QUESTIONS",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

/// Failures of the text-completion provider, grouped the way they are shown
/// to players.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider call timed out after {0}s")]
    Timeout(u64),
}

impl ProviderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::Unauthorized(_) => {
                "The quiz generator could not authenticate with the AI provider. Please try again later."
            }
            ProviderError::RateLimited(_) => {
                "Too many quizzes are being generated right now. Please wait a moment and try again."
            }
            ProviderError::Unavailable(_)
            | ProviderError::MalformedResponse(_)
            | ProviderError::Timeout(_) => {
                "The AI provider is overloaded or unavailable. Please try again."
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ProviderError::Unauthorized(_) => "PROVIDER_UNAUTHORIZED",
            ProviderError::RateLimited(_) => "PROVIDER_RATE_LIMITED",
            ProviderError::Unavailable(_) => "PROVIDER_UNAVAILABLE",
            ProviderError::MalformedResponse(_) => "PROVIDER_MALFORMED_RESPONSE",
            ProviderError::Timeout(_) => "PROVIDER_TIMEOUT",
        }
    }
}

/// Terminal outcome of a structured extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("extraction failed after {attempts} attempt(s): {last_reason}")]
    Failed { attempts: u32, last_reason: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Model output that could not be coerced into JSON, even after repair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("question {index}: {reason}")]
pub struct QuestionValidationFailed {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Provider(ProviderError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Provider(ProviderError::Unavailable(_) | ProviderError::Timeout(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidQuestions(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
        })
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err)
    }
}
impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Provider(provider) => AppError::Provider(provider),
            failed @ ExtractionError::Failed { .. } => AppError::GenerationFailed(failed.to_string()),
        }
    }
}
impl From<QuestionValidationFailed> for AppError {
    fn from(err: QuestionValidationFailed) -> Self {
        AppError::InvalidQuestions(err.to_string())
    }
}
impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}
impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
impl From<async_graphql::Error> for AppError {
    fn from(err: async_graphql::Error) -> Self {
        AppError::InternalError(err.message)
    }
}
impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_err, e| {
            e.set("code", self.error_code());
        })
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::NotFound("test".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ValidationError("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Provider(ProviderError::RateLimited("slow down".into())).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Provider(ProviderError::Timeout(30)).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Provider(ProviderError::Unauthorized("bad key".into())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::NotFound("game".into());
        assert_eq!(err.to_string(), "Not found: game");
    }

    #[test]
    fn provider_errors_show_distinct_user_messages() {
        let auth = AppError::from(ProviderError::Unauthorized("401".into())).to_string();
        let rate = AppError::from(ProviderError::RateLimited("429".into())).to_string();
        let overload = AppError::from(ProviderError::Unavailable("503".into())).to_string();

        assert_ne!(auth, rate);
        assert_ne!(rate, overload);
        assert_ne!(auth, overload);
        assert!(!auth.contains("401"));
    }

    #[test]
    fn extraction_errors_map_to_their_categories() {
        let exhausted: AppError = ExtractionError::Failed {
            attempts: 3,
            last_reason: "missing field `answer`".into(),
        }
        .into();
        assert!(matches!(exhausted, AppError::GenerationFailed(ref m) if m.contains("3 attempt")));

        let provider: AppError = ExtractionError::Provider(ProviderError::RateLimited("x".into())).into();
        assert!(matches!(provider, AppError::Provider(ProviderError::RateLimited(_))));

        let invalid: AppError = QuestionValidationFailed {
            index: 2,
            reason: "expected 4 options, got 3".into(),
        }
        .into();
        assert_eq!(invalid.error_code(), "INVALID_QUESTIONS");
    }
}

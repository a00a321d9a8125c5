use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentEngineError>;

#[derive(Error, Debug)]
pub enum ContentEngineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Author name is required for anonymous comments")]
    AuthorRequired,

    #[error("Categorie not found: {0}")]
    CategorieNotFound(uuid::Uuid),

    #[error("Article not found: {0}")]
    ArticleNotFound(uuid::Uuid),

    #[error("Article not found for slug: {0}")]
    ArticleSlugNotFound(String),

    #[error("Commentaire not found: {0}")]
    CommentaireNotFound(uuid::Uuid),

    #[error("Tag not found: {0}")]
    TagNotFound(uuid::Uuid),

    #[error("Skill not found: {0}")]
    SkillNotFound(uuid::Uuid),

    #[error("Invalid parent: {0}")]
    InvalidParent(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Insufficient privileges")]
    Forbidden,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for ContentEngineError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let mut body = json!({
            "error": {
                "code": status_code.as_u16(),
                "message": self.to_string(),
                "type": self.error_type()
            }
        });

        // Per-field breakdown for validation failures
        if let ContentEngineError::Validation(errors) = self {
            if let Ok(fields) = serde_json::to_value(errors) {
                body["error"]["fields"] = fields;
            }
        }

        HttpResponse::build(status_code).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ContentEngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ContentEngineError::Validation(_) => StatusCode::BAD_REQUEST,
            ContentEngineError::AuthorRequired => StatusCode::BAD_REQUEST,
            ContentEngineError::CategorieNotFound(_) => StatusCode::NOT_FOUND,
            ContentEngineError::ArticleNotFound(_) => StatusCode::NOT_FOUND,
            ContentEngineError::ArticleSlugNotFound(_) => StatusCode::NOT_FOUND,
            ContentEngineError::CommentaireNotFound(_) => StatusCode::NOT_FOUND,
            ContentEngineError::TagNotFound(_) => StatusCode::NOT_FOUND,
            ContentEngineError::SkillNotFound(_) => StatusCode::NOT_FOUND,
            ContentEngineError::InvalidParent(_) => StatusCode::BAD_REQUEST,
            ContentEngineError::Conflict(_) => StatusCode::CONFLICT,
            ContentEngineError::Unauthorized => StatusCode::UNAUTHORIZED,
            ContentEngineError::Forbidden => StatusCode::FORBIDDEN,
            ContentEngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ContentEngineError {
    fn error_type(&self) -> &str {
        match self {
            ContentEngineError::Database(_) => "database_error",
            ContentEngineError::Validation(_) => "validation_error",
            ContentEngineError::AuthorRequired => "validation_error",
            ContentEngineError::CategorieNotFound(_) => "not_found",
            ContentEngineError::ArticleNotFound(_) => "not_found",
            ContentEngineError::ArticleSlugNotFound(_) => "not_found",
            ContentEngineError::CommentaireNotFound(_) => "not_found",
            ContentEngineError::TagNotFound(_) => "not_found",
            ContentEngineError::SkillNotFound(_) => "not_found",
            ContentEngineError::InvalidParent(_) => "invalid_parent",
            ContentEngineError::Conflict(_) => "conflict",
            ContentEngineError::Unauthorized => "unauthorized",
            ContentEngineError::Forbidden => "forbidden",
            ContentEngineError::Internal(_) => "internal_error",
        }
    }
}

use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One rejected input field, reported back to the client as-is.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Collects field violations so a request reports all of them at once.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.0.push(FieldError::new(field, message));
        }
        self
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Auth(&'static str),

    #[error("admin access required")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn invalid_credentials() -> Self {
        ApiError::Auth("Invalid credentials")
    }

    pub fn invalid_field(field: &str, message: &str) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn malformed_body(detail: impl std::fmt::Display) -> Self {
        ApiError::Validation(vec![FieldError::new("body", detail.to_string())])
    }

    /// Recovers the `ApiError` behind an extractor failure. Anything else is
    /// treated as an unreadable request body.
    pub fn from_extractor(err: actix_web::Error) -> Self {
        match err.as_error::<ApiError>() {
            Some(api_error) => api_error.clone(),
            None => ApiError::malformed_body(err),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(errors) => json!({ "errors": errors }),
            ApiError::Auth(message) => json!({ "error": message }),
            ApiError::Forbidden => json!({ "error": "Admin access required" }),
            ApiError::Conflict(message) | ApiError::NotFound(message) => {
                json!({ "error": message })
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "request failed");
                json!({ "error": "Internal server error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let message = match info.constraint_name() {
                    Some("users_username_key") | Some("users_email_key") => {
                        "Username or email already exists"
                    }
                    Some("products_name_key") => "Product name already exists",
                    _ => "Resource already exists",
                };
                ApiError::Conflict(message.to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                ApiError::Validation(vec![FieldError::new(
                    info.column_name().unwrap_or("reference"),
                    "refers to a record that does not exist or is still in use",
                )])
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                ApiError::Validation(vec![FieldError::new(
                    info.constraint_name().unwrap_or("value"),
                    "value is out of range",
                )])
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(err: r2d2::Error) -> Self {
        ApiError::Internal(format!("connection pool: {err}"))
    }
}

impl From<BlockingError> for ApiError {
    fn from(err: BlockingError) -> Self {
        ApiError::Internal(format!("blocking task: {err}"))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::Internal(format!("token signing: {err}"))
    }
}

/// Failures that abort the process before the HTTP server starts.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("seeding failed: {0}")]
    Seed(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

use actix_web::{error, http::StatusCode, HttpResponse};
use derive_more::{Display, Error};
use log::error;

/// Error kinds shared by every layer. Handlers never match on error text;
/// the variant alone decides the HTTP status.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display(fmt = "validation failed: {}", _0)]
    Validation(#[error(not(source))] String),

    #[display(fmt = "username or email already exists")]
    DuplicateCredential,

    #[display(fmt = "not found")]
    NotFound,

    #[display(fmt = "forbidden")]
    NotAuthorized,

    #[display(fmt = "invalid credentials")]
    Unauthenticated,

    #[display(fmt = "storage failure: {}", _0)]
    Storage(#[error(not(source))] String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Storage(other.to_string()),
        }
    }
}

impl error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        if let ApiError::Storage(detail) = self {
            error!("storage failure: {detail}");
        }
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateCredential => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::NotAuthorized => StatusCode::FORBIDDEN,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

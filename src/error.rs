use axum::response::{Html, IntoResponse, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("unauthorized, please log in: {0}")]
    Unauthorized(String),

    #[error("forbidden, you do not have permission: {0}")]
    Forbidden(String),

    #[error("server error, please try again later: {0}")]
    Server(String),

    #[error("request failed ({status}): {message}")]
    Request { status: StatusCode, message: String },

    #[error("could not reach backend: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("backend returned no content")]
    EmptyBody,

    #[error("invalid movie id {0}")]
    InvalidId(i64),
}

impl ApiError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = ErrorBody::parse(body)
            .as_ref()
            .and_then(ErrorBody::message)
            .map(str::to_string)
            .unwrap_or_else(|| status_text(status).to_string());

        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::FORBIDDEN => ApiError::Forbidden(message),
            s if s.is_server_error() => ApiError::Server(message),
            _ => ApiError::Request { status, message },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    // Backend message without the category prefix.
    pub fn message(&self) -> String {
        match self {
            ApiError::NotFound(m)
            | ApiError::Unauthorized(m)
            | ApiError::Forbidden(m)
            | ApiError::Server(m)
            | ApiError::Request { message: m, .. } => m.clone(),
            other => other.to_string(),
        }
    }
}

pub fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

// Backend error payloads carry `message`, `errors`, or both.
#[derive(Debug, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<Vec<String>>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| self.errors.as_ref()?.first().map(String::as_str))
            .filter(|m| !m.is_empty())
    }
}

#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = crate::templates::error_page(self.to_string());
        Html(body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

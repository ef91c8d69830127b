use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde_json::json;
use std::env;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Operation is illegal in the entity's current lifecycle state.
    #[error("invalid state: {current}")]
    InvalidState { current: String },

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("insufficient balance, current balance: {balance}")]
    InsufficientFunds { balance: Decimal },

    #[error("rating must be between 1 and 5")]
    InvalidRating,

    /// Settlement failed; the order was left in its previous valid state.
    #[error("payment failed: {0}, order reverted to IN_TRANSIT")]
    Payment(#[source] Box<Error>),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("environment variable error: {0}")]
    Env(#[from] env::VarError),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn invalid_state(current: impl Display) -> Self {
        Self::InvalidState {
            current: current.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::InvalidState { .. } => StatusCode::CONFLICT,
            Error::InvalidAmount | Error::InvalidRating => StatusCode::BAD_REQUEST,
            Error::InsufficientFunds { .. } | Error::Payment(_) => StatusCode::PAYMENT_REQUIRED,
            Error::Database(_) | Error::Env(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Upstream(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
        };

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "internal server error".to_string(),
            _ => self.to_string(),
        };

        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::{APIResponse, ENDPOINTS};
use crate::repository::StoreError;
use crate::validate::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Invalid request body: {0}")]
    MalformedBody(String),
    #[error("Invalid query string: {0}")]
    MalformedQuery(String),
    #[error("School not found")]
    NotFound,
    /// `message` goes to the client; `source` only when `expose` is set.
    #[error("{message}")]
    Storage {
        message: &'static str,
        #[source]
        source: StoreError,
        expose: bool,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) | ApiError::MalformedQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = APIResponse::failure(&self.to_string());

        if let ApiError::Storage {
            message,
            source,
            expose,
        } = &self
        {
            tracing::error!(error = %source, "{}", message);
            if *expose {
                body.error = Some(source.to_string());
            }
        }

        (status, Json(body)).into_response()
    }
}

pub async fn route_not_found() -> Response {
    let mut body = APIResponse::failure("API endpoint not found");
    body.available_endpoints = Some(ENDPOINTS);
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// Turns a panic inside a handler into the generic 500 envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(APIResponse::failure("Internal server error")),
    )
        .into_response()
}

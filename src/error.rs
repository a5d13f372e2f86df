//! Error taxonomy shared by the store, the auth gate and the handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

/// Failures raised by a `UserStore` / `TaskStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A single rejected request field.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Request-level outcome consumed by the response layer.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => AppError::Conflict(what),
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::Validation(fields) => json!({
                "error": "validation failed",
                "fields": fields,
            }),
            AppError::Unauthenticated => json!({ "error": "unauthenticated" }),
            AppError::NotFound => json!({ "error": "not found" }),
            AppError::Conflict(what) => json!({ "error": format!("{what} already exists") }),
            AppError::Internal(e) => {
                error!(error = %format!("{e:#}"), "internal error");
                json!({ "error": "internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

/// `Json` whose rejections surface as a `body` validation error.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `Path` whose rejections (e.g. a non-numeric id) read as not found.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match &rejection {
            JsonRejection::JsonSyntaxError(_) => "must be valid JSON",
            JsonRejection::JsonDataError(_) => "has fields of the wrong type",
            JsonRejection::MissingJsonContentType(_) => "must be sent as application/json",
            _ => "could not be read",
        };
        debug!(detail = %rejection.body_text(), "request body rejected");
        AppError::Validation(vec![FieldError::new("body", message)])
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        debug!(detail = %rejection.body_text(), "path rejected");
        AppError::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_maps_to_conflict() {
        let err: AppError = StoreError::Conflict("email").into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "email already exists");
    }

    #[test]
    fn internal_detail_is_not_returned() {
        let res = AppError::Internal(anyhow::anyhow!("pool timed out")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let res = AppError::Validation(vec![FieldError::new("heading", "must not be empty")])
            .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["fields"][0]["field"], "heading");
    }

    #[tokio::test]
    async fn malformed_json_body_is_a_body_validation_error() {
        let req = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{\"heading\":"))
            .unwrap();
        let err = JsonBody::<serde_json::Value>::from_request(req, &())
            .await
            .unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields, vec![FieldError::new("body", "must be valid JSON")]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_content_type_is_a_body_validation_error() {
        let req = axum::http::Request::builder()
            .body(axum::body::Body::from("{}"))
            .unwrap();
        let err = JsonBody::<serde_json::Value>::from_request(req, &())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}

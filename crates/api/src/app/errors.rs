use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bookstock_infra::{IndexError, ServiceError, StoreError};

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::Store(StoreError::NotFound(id)) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("stock {id} not found"),
        ),
        ServiceError::Store(StoreError::Concurrency(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        ServiceError::Store(e @ StoreError::Backend(_)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        ServiceError::Index(IndexError::InvalidQuery(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_query", msg)
        }
        ServiceError::Index(e @ IndexError::Backend(_)) => {
            json_error(StatusCode::BAD_GATEWAY, "index_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

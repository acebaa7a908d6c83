use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderName, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use bookstock_core::Page;
use bookstock_inventory::{StockOutcome, StockRecord, Trigger};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

const TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

pub fn router() -> Router {
    Router::new()
        .route("/stocks", post(create_stock).put(update_stock).get(list_stocks))
        .route("/stocks/:id", get(get_stock).delete(delete_stock))
        .route("/stocks/:id/borrow", patch(borrow_stock))
        .route("/stocks/:id/return", patch(return_stock))
        .route("/_search/stocks", get(search_stocks))
        .route("/_reindex/stocks", post(reindex_stocks))
}

pub async fn create_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::StockRequest>,
) -> axum::response::Response {
    tracing::debug!(?body, "request to create stock");
    if body.id.is_some() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "id_exists",
            "a new stock cannot already have an id",
        );
    }
    let record = match body.into_record() {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services.inventory().save(record) {
        Ok(saved) => (StatusCode::CREATED, Json(saved)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::StockRequest>,
) -> axum::response::Response {
    tracing::debug!(?body, "request to update stock");
    if body.id.is_none() {
        return errors::json_error(StatusCode::BAD_REQUEST, "id_null", "an updated stock needs an id");
    }
    let record = match body.into_record() {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services.inventory().save(record) {
        Ok(saved) => (StatusCode::OK, Json(saved)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn borrow_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    apply_trigger(&services, &id, Trigger::Borrow)
}

pub async fn return_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    apply_trigger(&services, &id, Trigger::Return)
}

fn apply_trigger(services: &AppServices, raw_id: &str, trigger: Trigger) -> axum::response::Response {
    let id = match dto::parse_stock_id(raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let result = match trigger {
        Trigger::Borrow => services.inventory().borrow_book(id),
        Trigger::Return => services.inventory().return_book(id),
    };

    match result {
        Ok(outcome) => (
            outcome_status(outcome),
            Json(serde_json::json!({ "id": id, "outcome": outcome.as_str() })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn outcome_status(outcome: StockOutcome) -> StatusCode {
    match outcome {
        StockOutcome::Available => StatusCode::ACCEPTED,
        StockOutcome::OutOfStock => StatusCode::NOT_ACCEPTABLE,
        StockOutcome::OutOfBorrow => StatusCode::FORBIDDEN,
        StockOutcome::NotFound => StatusCode::NOT_FOUND,
    }
}

pub async fn list_stocks(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::PageParams>,
) -> axum::response::Response {
    let pageable = services.pageable(params.page, params.size);
    match services.inventory().find_all(&pageable) {
        Ok(page) => page_response(page),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_stock_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.inventory().find_one(id) {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("stock {id} not found"),
        ),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match dto::parse_stock_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.inventory().delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn search_stocks(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::SearchParams>,
) -> axum::response::Response {
    let pageable = services.pageable(params.page, params.size);
    match services.inventory().search(&params.query, &pageable) {
        Ok(page) => page_response(page),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reindex_stocks(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.inventory().reindex_all() {
        Ok(indexed) => (StatusCode::OK, Json(serde_json::json!({ "indexed": indexed }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn page_response(page: Page<StockRecord>) -> axum::response::Response {
    (
        StatusCode::OK,
        [(TOTAL_COUNT, page.total_elements.to_string())],
        Json(page.content),
    )
        .into_response()
}

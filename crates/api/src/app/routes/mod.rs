use axum::Router;

pub mod stocks;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    stocks::router()
}

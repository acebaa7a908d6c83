use serde::Deserialize;

use bookstock_core::StockId;
use bookstock_inventory::{StockRecord, StockStatus};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /stocks` and `PUT /stocks`.
#[derive(Debug, Deserialize)]
pub struct StockRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<i64>,
    #[serde(alias = "bookStockStatus")]
    pub status: Option<StockStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

impl StockRequest {
    /// Validated record for the service. The id, if any, is parsed but its
    /// presence is checked by the handler (create vs update).
    pub fn into_record(self) -> Result<StockRecord, axum::response::Response> {
        let id = self.id.as_deref().map(parse_stock_id).transpose()?;

        let Some(quantity) = self.quantity else {
            return Err(validation("quantity is required"));
        };
        if quantity < 0 {
            return Err(validation("quantity must be greater than or equal to 0"));
        }
        let Some(status) = self.status else {
            return Err(validation("status is required"));
        };

        let mut record = StockRecord::new(self.name, quantity, status);
        record.id = id;
        record
            .validate()
            .map_err(|e| validation(e.to_string()))?;
        Ok(record)
    }
}

pub fn parse_stock_id(raw: &str) -> Result<StockId, axum::response::Response> {
    raw.parse::<StockId>().map_err(|e| {
        errors::json_error(axum::http::StatusCode::BAD_REQUEST, "invalid_id", e.to_string())
    })
}

fn validation(message: impl Into<String>) -> axum::response::Response {
    errors::json_error(
        axum::http::StatusCode::BAD_REQUEST,
        "validation_error",
        message,
    )
}

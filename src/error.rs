use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use redis::RedisError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const SHOP_CLOSED_MESSAGE: &str = "The shop is currently closed due to low stock.";

/// Field path to messages, e.g. `products.0.product_id -> ["..."]`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("request validation failed")]
    Validation(FieldErrors),
    #[error("{}", SHOP_CLOSED_MESSAGE)]
    ShopClosed,
    #[error("product {0} not found")]
    ProductNotFound(u64),
    #[error("order with id {0} not found")]
    OrderNotFound(String),
    #[error("ingredient {0} not found")]
    IngredientNotFound(u64),
    #[error("redis error: {0}")]
    RedisError(#[from] RedisError),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("notification failed: {0}")]
    Notification(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        AppError::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "errors": errors }),
            ),
            AppError::ShopClosed => (
                StatusCode::FORBIDDEN,
                json!({ "success": false, "message": SHOP_CLOSED_MESSAGE }),
            ),
            AppError::ProductNotFound(_) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "errors": { "product_id": ["Product not found"] } }),
            ),
            AppError::OrderNotFound(ref id) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": format!("Order with id {} not found", id) }),
            ),
            other => {
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": other.to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

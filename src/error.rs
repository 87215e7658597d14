//! Error types shared across the storefront core.
//!
//! Each concern owns a small `thiserror` enum; [`AppError`] is the HTTP-facing
//! wrapper that maps them onto status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures raised by cart operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CartError {
    #[error("Quantity must be a positive integer")]
    InvalidQuantity,

    #[error("Discount must be between 0 and 100, got {0}")]
    InvalidDiscount(f64),

    #[error("Cart item {0} not found")]
    ItemNotFound(String),
}

/// Failures raised by the product catalog collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Product {0} not found")]
    NotFound(String),

    #[error("Invalid query parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Failures raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read catalog seed {path}: {source}")]
    CatalogSeed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog seed: {0}")]
    MalformedSeed(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Cart is empty")]
    EmptyCart,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Cart(CartError::ItemNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Cart(_) => StatusCode::BAD_REQUEST,
            AppError::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Catalog(CatalogError::InvalidParameter { .. }) => StatusCode::BAD_REQUEST,
            AppError::Catalog(CatalogError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            AppError::EmptyCart => StatusCode::BAD_REQUEST,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

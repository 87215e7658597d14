//! Product Catalog Module
//!
//! This module contains the product-listing side of the storefront:
//! - Product, sort and pagination models
//! - Query parameter parsing and encoding
//! - The catalog collaborator trait and its in-memory implementation
//! - REST API handlers

pub mod handlers;
pub mod models;
pub mod query;
pub mod source;

// Re-export commonly used types for convenience
pub use handlers::routes;
pub use models::{Pagination, Product, ProductPage, SortKey};
pub use query::ProductQuery;
pub use source::{search_with_fallback, InMemoryCatalog, ProductCatalog};

//! REST API handlers for product listings.

use super::{query::ProductQuery, source::search_with_fallback};
use crate::error::{AppError, CatalogError};
use crate::filters::{FilterBounds, FilterDefaults};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::debug;

/// Creates routes for catalog operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:product_id", get(get_product))
        .route("/filters/bounds", get(filter_bounds))
}

/// Endpoint: GET /products
/// Filters, sorts and paginates the catalog. Identical queries within the
/// cache ttl are answered from the response cache.
async fn list_products(
    State(state): State<SharedState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let query = ProductQuery::from_pairs(&params)?;
    let key = query.cache_key();

    if let Some(page) = state.product_cache.get(&key) {
        debug!(%key, "product listing served from cache");
        return Ok(Json(page));
    }

    let page = search_with_fallback(state.catalog.as_ref(), &query).await?;
    state.product_cache.set(key, page.clone());
    Ok(Json(page))
}

/// Endpoint: GET /products/{product_id}
async fn get_product(
    State(state): State<SharedState>,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product_id = product_id.trim();
    if product_id.is_empty() {
        return Err(CatalogError::NotFound(product_id.to_string()).into());
    }
    let product = state.catalog.get(product_id).await?;
    Ok(Json(product))
}

/// Endpoint: GET /filters/bounds
/// Price and case-size extremes for initializing filter ranges; the default
/// ranges when the catalog is empty.
async fn filter_bounds(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let bounds = state.catalog.bounds().await?.unwrap_or_else(|| {
        let defaults = FilterDefaults::default();
        FilterBounds {
            price_range: defaults.price_range,
            case_size_range: defaults.case_size_range,
        }
    });
    Ok(Json(bounds))
}

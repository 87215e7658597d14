//! Product catalog collaborator.
//!
//! [`ProductCatalog`] is the seam to whatever backs product listings. The
//! in-memory implementation filters, sorts and paginates a fixed product
//! list and is what the service runs with when seeded from a JSON file.

use super::{
    models::{bounds_of, Pagination, Product, ProductPage, SortKey},
    query::ProductQuery,
};
use crate::error::{CatalogError, ConfigError};
use crate::filters::{FilterBounds, FilterDimension};
use futures_util::future::{self, BoxFuture, FutureExt};
use std::path::Path;
use tracing::{info, warn};

pub trait ProductCatalog: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a ProductQuery,
    ) -> BoxFuture<'a, Result<ProductPage, CatalogError>>;

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Product, CatalogError>>;

    /// Price and case-size extremes used to initialize filter ranges.
    fn bounds(&self) -> BoxFuture<'_, Result<Option<FilterBounds>, CatalogError>>;
}

/// Runs `query`, retrying once without the case-size range when a query
/// that carries one fails.
pub async fn search_with_fallback(
    catalog: &dyn ProductCatalog,
    query: &ProductQuery,
) -> Result<ProductPage, CatalogError> {
    match catalog.search(query).await {
        Ok(page) => Ok(page),
        Err(CatalogError::Unavailable(reason)) if query.has_case_size() => {
            warn!(%reason, "product query failed, retrying without case size");
            catalog.search(&query.without_case_size()).await
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Loads a JSON array of products.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogSeed {
            path: path.display().to_string(),
            source,
        })?;
        let products: Vec<Product> = serde_json::from_str(&raw)?;
        info!(count = products.len(), path = %path.display(), "catalog seeded");
        Ok(Self::new(products))
    }

    fn run(&self, query: &ProductQuery) -> ProductPage {
        let mut matches: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| matches_query(p, query))
            .collect();
        sort_products(&mut matches, query.sort_by);

        let page = query.page.max(1);
        let pagination = Pagination::new(page, query.page_size, matches.len() as u64);
        let start = (page as usize - 1).saturating_mul(query.page_size as usize);
        let products = matches
            .into_iter()
            .skip(start)
            .take(query.page_size as usize)
            .cloned()
            .collect();

        ProductPage {
            products,
            pagination,
        }
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn search<'a>(
        &'a self,
        query: &'a ProductQuery,
    ) -> BoxFuture<'a, Result<ProductPage, CatalogError>> {
        future::ready(Ok(self.run(query))).boxed()
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Product, CatalogError>> {
        let found = self
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()));
        future::ready(found).boxed()
    }

    fn bounds(&self) -> BoxFuture<'_, Result<Option<FilterBounds>, CatalogError>> {
        future::ready(Ok(bounds_of(&self.products))).boxed()
    }
}

fn field_for(product: &Product, dimension: FilterDimension) -> Option<&str> {
    match dimension {
        FilterDimension::Brands => Some(product.brand.as_str()),
        FilterDimension::Categories => Some(product.category.as_str()),
        FilterDimension::Genders => product.gender.as_deref(),
        FilterDimension::Bands => product.band.as_deref(),
        FilterDimension::CaseColors => product.case_color.as_deref(),
        FilterDimension::Colors => product.color.as_deref(),
    }
}

fn matches_query(product: &Product, query: &ProductQuery) -> bool {
    let selections_match = query.selections.iter().all(|(dimension, wanted)| {
        wanted.is_empty()
            || field_for(product, *dimension)
                .is_some_and(|value| wanted.iter().any(|w| w.eq_ignore_ascii_case(value)))
    });
    if !selections_match {
        return false;
    }
    if let Some(price) = query.price {
        if !price.contains(product.price) {
            return false;
        }
    }
    match (query.case_size, product.case_size) {
        (Some(range), Some(size)) => range.contains(size),
        (Some(_), None) => false,
        (None, _) => true,
    }
}

fn sort_products(products: &mut [&Product], sort_by: SortKey) {
    match sort_by {
        SortKey::PriceAsc => products.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::PriceDesc => products.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Rating | SortKey::Featured => {
            products.sort_by(|a, b| b.rating.total_cmp(&a.rating))
        }
    }
}

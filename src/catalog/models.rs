//! Product catalog models.

use crate::cart::models::{default_currency, ProductRef};
use crate::filters::{FilterBounds, FilterDefaults, Range};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A sellable product (watch, accessory or bag).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub band: Option<String>,
    #[serde(default)]
    pub case_color: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub price: f64,
    /// Case diameter in millimetres; absent for products without a case
    #[serde(default)]
    pub case_size: Option<f64>,
    #[serde(default)]
    pub rating: f64,
    /// Unix timestamp (seconds) the product was listed
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub discount: Option<f64>,
}

impl From<&Product> for ProductRef {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price,
            image: product.image.clone(),
            currency: product.currency.clone(),
            discount: product.discount,
        }
    }
}

/// Ordering of a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    Newest,
    Rating,
    /// Descending rating
    #[default]
    Featured,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::Newest => "newest",
            SortKey::Rating => "rating",
            SortKey::Featured => "featured",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price-asc" => Ok(SortKey::PriceAsc),
            "price-desc" => Ok(SortKey::PriceDesc),
            "newest" => Ok(SortKey::Newest),
            "rating" => Ok(SortKey::Rating),
            "featured" => Ok(SortKey::Featured),
            other => Err(format!("unknown sort key {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl Pagination {
    pub fn new(current_page: u32, page_size: u32, total_count: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_count.div_ceil(u64::from(page_size));
        Self {
            current_page,
            page_size,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            total_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Price and case-size extremes of `products`, or `None` for an empty list.
///
/// When no product carries a case size the default case-size range is used.
pub fn bounds_of(products: &[Product]) -> Option<FilterBounds> {
    let first = products.first()?;
    let price_range = products.iter().fold(Range::new(first.price, first.price), |r, p| {
        Range::new(r.min.min(p.price), r.max.max(p.price))
    });
    let case_size_range = products
        .iter()
        .filter_map(|p| p.case_size)
        .fold(None, |acc: Option<Range>, size| {
            Some(match acc {
                Some(r) => Range::new(r.min.min(size), r.max.max(size)),
                None => Range::new(size, size),
            })
        })
        .unwrap_or(FilterDefaults::default().case_size_range);
    Some(FilterBounds {
        price_range,
        case_size_range,
    })
}

//! Product query parameters.
//!
//! A [`ProductQuery`] is what the catalog collaborator receives. It is built
//! from an emitted [`FilterSnapshot`] or parsed from URL query pairs, and
//! encodes back to the same flat parameter names.

use super::models::SortKey;
use crate::error::CatalogError;
use crate::filters::{FilterDimension, FilterSnapshot, Range};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductQuery {
    pub selections: BTreeMap<FilterDimension, BTreeSet<String>>,
    pub price: Option<Range>,
    pub case_size: Option<Range>,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortKey,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            selections: BTreeMap::new(),
            price: None,
            case_size: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortKey::default(),
        }
    }
}

impl ProductQuery {
    pub fn from_snapshot(snapshot: &FilterSnapshot, page: u32, sort_by: SortKey) -> Self {
        let selections = FilterDimension::ALL
            .into_iter()
            .filter(|d| !snapshot.values(*d).is_empty())
            .map(|d| (d, snapshot.values(d).clone()))
            .collect();
        Self {
            selections,
            price: Some(snapshot.price_range),
            case_size: Some(snapshot.case_size_range),
            page: page.max(1),
            page_size: DEFAULT_PAGE_SIZE,
            sort_by,
        }
    }

    /// Parses URL query pairs. Dimension values may be repeated or
    /// comma-separated; unknown parameters are ignored.
    pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> Result<Self, CatalogError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        let mut min_price = None;
        let mut max_price = None;
        let mut min_case = None;
        let mut max_case = None;

        for (name, value) in pairs {
            let (name, value) = (name.as_ref(), value.as_ref().trim());
            if let Some(dimension) = FilterDimension::from_query_param(name) {
                let values = value
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string);
                query.selections.entry(dimension).or_default().extend(values);
                continue;
            }
            match name {
                "minPrice" => min_price = Some(parse_number(name, value)?),
                "maxPrice" => max_price = Some(parse_number(name, value)?),
                "minCaseSize" => min_case = Some(parse_number(name, value)?),
                "maxCaseSize" => max_case = Some(parse_number(name, value)?),
                "page" => query.page = parse_positive(name, value)?,
                "pageSize" => query.page_size = parse_positive(name, value)?.min(MAX_PAGE_SIZE),
                "sortBy" => {
                    query.sort_by = value.parse().map_err(|_| invalid(name, value))?;
                }
                _ => {}
            }
        }

        query.selections.retain(|_, values| !values.is_empty());
        query.price = open_range(min_price, max_price);
        query.case_size = open_range(min_case, max_case);
        Ok(query)
    }

    /// Encodes the query as flat parameters in a stable order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (dimension, values) in &self.selections {
            if !values.is_empty() {
                let joined = values.iter().cloned().collect::<Vec<_>>().join(",");
                pairs.push((dimension.query_param().to_string(), joined));
            }
        }
        push_range(&mut pairs, self.price, "minPrice", "maxPrice");
        push_range(&mut pairs, self.case_size, "minCaseSize", "maxCaseSize");
        pairs.push(("page".into(), self.page.to_string()));
        pairs.push(("pageSize".into(), self.page_size.to_string()));
        pairs.push(("sortBy".into(), self.sort_by.to_string()));
        pairs
    }

    /// Response-cache key of this query. Values are JSON-escaped, so two
    /// distinct queries never share a key.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }

    pub fn has_case_size(&self) -> bool {
        self.case_size.is_some()
    }

    /// The same query with the case-size range removed.
    pub fn without_case_size(&self) -> Self {
        Self {
            case_size: None,
            ..self.clone()
        }
    }
}

fn invalid(name: &str, value: &str) -> CatalogError {
    CatalogError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_number(name: &str, value: &str) -> Result<f64, CatalogError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(name, value))
}

fn parse_positive(name: &str, value: &str) -> Result<u32, CatalogError> {
    value
        .parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| invalid(name, value))
}

/// Open ends of a half-open range are left out.
fn push_range(pairs: &mut Vec<(String, String)>, range: Option<Range>, min: &str, max: &str) {
    let Some(range) = range else {
        return;
    };
    if range.min.is_finite() {
        pairs.push((min.to_string(), range.min.to_string()));
    }
    if range.max.is_finite() {
        pairs.push((max.to_string(), range.max.to_string()));
    }
}

fn open_range(min: Option<f64>, max: Option<f64>) -> Option<Range> {
    match (min, max) {
        (None, None) => None,
        (min, max) => Some(Range::new(
            min.unwrap_or(f64::NEG_INFINITY),
            max.unwrap_or(f64::INFINITY),
        )),
    }
}

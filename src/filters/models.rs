//! Filter selection models.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// One independent facet of product filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterDimension {
    Brands,
    Categories,
    Genders,
    Bands,
    CaseColors,
    Colors,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 6] = [
        FilterDimension::Brands,
        FilterDimension::Categories,
        FilterDimension::Genders,
        FilterDimension::Bands,
        FilterDimension::CaseColors,
        FilterDimension::Colors,
    ];

    /// Key of the dimension in an emitted filter record.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterDimension::Brands => "brands",
            FilterDimension::Categories => "categories",
            FilterDimension::Genders => "genders",
            FilterDimension::Bands => "bands",
            FilterDimension::CaseColors => "caseColors",
            FilterDimension::Colors => "colors",
        }
    }

    /// Name of the product-query parameter carrying this dimension.
    pub fn query_param(self) -> &'static str {
        match self {
            FilterDimension::Brands => "brand",
            FilterDimension::Categories => "category",
            FilterDimension::Genders => "gender",
            FilterDimension::Bands => "band",
            FilterDimension::CaseColors => "caseColor",
            FilterDimension::Colors => "color",
        }
    }

    pub fn from_query_param(param: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.query_param() == param)
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDimension(pub String);

impl fmt::Display for UnknownDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown filter dimension: {}", self.0)
    }
}

impl std::error::Error for UnknownDimension {}

impl FromStr for FilterDimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownDimension(s.to_string()))
    }
}

/// Closed numeric interval with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Builds a range, swapping reversed bounds.
    pub fn new(min: f64, max: f64) -> Self {
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ranges a pipeline starts from and returns to on clear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterDefaults {
    pub price_range: Range,
    pub case_size_range: Range,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            price_range: Range::new(0.0, 10_000.0),
            case_size_range: Range::new(20.0, 50.0),
        }
    }
}

/// Server-provided extremes of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBounds {
    pub price_range: Range,
    pub case_size_range: Range,
}

impl From<FilterBounds> for FilterDefaults {
    fn from(bounds: FilterBounds) -> Self {
        Self {
            price_range: bounds.price_range,
            case_size_range: bounds.case_size_range,
        }
    }
}

/// A fully-settled filter state, as emitted to consumers.
///
/// Value sets are ordered, so two snapshots holding the same selections
/// serialize identically whatever order the values were picked in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSnapshot {
    #[serde(default)]
    pub brands: BTreeSet<String>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub genders: BTreeSet<String>,
    #[serde(default)]
    pub bands: BTreeSet<String>,
    #[serde(default)]
    pub case_colors: BTreeSet<String>,
    #[serde(default)]
    pub colors: BTreeSet<String>,
    pub price_range: Range,
    pub case_size_range: Range,
}

impl FilterSnapshot {
    /// Snapshot with nothing selected and the given ranges.
    pub fn with_defaults(defaults: FilterDefaults) -> Self {
        Self {
            brands: BTreeSet::new(),
            categories: BTreeSet::new(),
            genders: BTreeSet::new(),
            bands: BTreeSet::new(),
            case_colors: BTreeSet::new(),
            colors: BTreeSet::new(),
            price_range: defaults.price_range,
            case_size_range: defaults.case_size_range,
        }
    }

    pub fn values(&self, dimension: FilterDimension) -> &BTreeSet<String> {
        match dimension {
            FilterDimension::Brands => &self.brands,
            FilterDimension::Categories => &self.categories,
            FilterDimension::Genders => &self.genders,
            FilterDimension::Bands => &self.bands,
            FilterDimension::CaseColors => &self.case_colors,
            FilterDimension::Colors => &self.colors,
        }
    }

    pub fn values_mut(&mut self, dimension: FilterDimension) -> &mut BTreeSet<String> {
        match dimension {
            FilterDimension::Brands => &mut self.brands,
            FilterDimension::Categories => &mut self.categories,
            FilterDimension::Genders => &mut self.genders,
            FilterDimension::Bands => &mut self.bands,
            FilterDimension::CaseColors => &mut self.case_colors,
            FilterDimension::Colors => &mut self.colors,
        }
    }

    /// Empties every dimension and resets both ranges.
    pub fn reset(&mut self, defaults: FilterDefaults) {
        *self = Self::with_defaults(defaults);
    }

    /// Canonical serialization used for change detection and cache keys.
    pub fn canonical(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Default for FilterSnapshot {
    fn default() -> Self {
        Self::with_defaults(FilterDefaults::default())
    }
}

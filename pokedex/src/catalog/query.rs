use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sentinel category meaning "no category filter"
pub const ALL_CATEGORIES: &str = "all";

/// Selected category, or [`ALL_CATEGORIES`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, categories: Option<&[String]>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => {
                categories.is_some_and(|cats| cats.iter().any(|c| c == wanted))
            }
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        if value.is_empty() || value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value)
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        value.to_string()
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CategoryFilter::from(s.to_string()))
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Only(name) => f.write_str(name),
        }
    }
}

/// Name ordering; `None` keeps index order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, clap::ValueEnum,
)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    #[value(name = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    #[value(name = "desc")]
    Descending,
    #[default]
    #[serde(rename = "none")]
    #[value(name = "none")]
    None,
}

/// Everything the pipeline needs to produce one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub search: String,
    #[schema(value_type = String, example = "fire")]
    pub category: CategoryFilter,
    pub sort: SortDirection,
    /// 1-indexed
    pub page: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: CategoryFilter::All,
            sort: SortDirection::None,
            page: 1,
        }
    }
}

// ── View state ──
//
// Everything a list page remembers between renders: the search term,
// one predicate per filter key, and the pagination cursor.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A single categorical filter predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterValue {
    /// No restriction.
    #[default]
    All,
    /// Exact match against the record's value for the key.
    Is(String),
}

impl FilterValue {
    pub fn is(value: impl Into<String>) -> Self {
        Self::Is(value.into())
    }

    pub fn matches(&self, candidate: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Is(expected) => candidate == Some(expected.as_str()),
        }
    }
}

impl FromStr for FilterValue {
    type Err = std::convert::Infallible;

    /// `""` and `"all"` (any case) lift the restriction.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Is(trimmed.to_owned()))
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Is(v) => f.write_str(v),
        }
    }
}

/// Number of records per page. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    /// The choices offered by the page-size selector.
    pub const STANDARD: [usize; 4] = [5, 10, 20, 50];

    pub fn new(size: usize) -> Result<Self, CoreError> {
        NonZeroUsize::new(size).map(Self).ok_or_else(|| {
            CoreError::validation("page_size", "page size must be at least 1")
        })
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(NonZeroUsize::MIN.saturating_add(9))
    }
}

impl TryFrom<usize> for PageSize {
    type Error = CoreError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

/// Search, filter and pagination state for one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub search_term: String,
    pub filters: IndexMap<String, FilterValue>,
    /// 1-based.
    pub page: usize,
    pub page_size: PageSize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            filters: IndexMap::new(),
            page: 1,
            page_size: PageSize::default(),
        }
    }
}

impl ViewState {
    /// A fresh state with every key in `keys` set to `All`.
    pub fn for_keys(keys: &[&str]) -> Self {
        Self {
            filters: keys
                .iter()
                .map(|k| ((*k).to_owned(), FilterValue::All))
                .collect(),
            ..Self::default()
        }
    }

    /// Filters that actually restrict the result set.
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().filter_map(|(k, v)| match v {
            FilterValue::All => None,
            FilterValue::Is(value) => Some((k.as_str(), value.as_str())),
        })
    }
}

// ── Facet reports ──
//
// Counts records per value of one filter key: the querying/reporting
// view over any managed list.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;
use crate::model::Listable;

/// Bucket for records without a value for the key.
pub const NO_VALUE: &str = "(none)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetReport {
    pub entity_type: &'static str,
    pub key: String,
    pub total: usize,
    /// Value -> count, largest first. Ties keep first-seen order.
    pub buckets: IndexMap<String, usize>,
}

/// Count `records` by their value for `key`, one of `T::FILTER_KEYS`.
pub fn facet_counts<T: Listable>(records: &[Arc<T>], key: &str) -> Result<FacetReport, CoreError> {
    if !T::FILTER_KEYS.contains(&key) {
        return Err(CoreError::Validation {
            field: Some(key.to_owned()),
            message: format!(
                "cannot group {} records by '{key}' (expected one of: {})",
                T::ENTITY_TYPE,
                T::FILTER_KEYS.join(", ")
            ),
        });
    }

    let mut buckets: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        let value = record
            .filter_value(key)
            .map_or_else(|| NO_VALUE.to_owned(), |v| v.into_owned());
        *buckets.entry(value).or_default() += 1;
    }
    buckets.sort_by(|_, a, _, b| b.cmp(a));

    Ok(FacetReport {
        entity_type: T::ENTITY_TYPE,
        key: key.to_owned(),
        total: records.len(),
        buckets,
    })
}

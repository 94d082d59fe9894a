//! Query parameters of `GET /api/pulse`.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::RequestError;
use crate::filters::{FilterDimension, FilterSet};

/// Decoded pulse query.
///
/// Filter parameters repeat (`?status_filter=to%20do&status_filter=bugs`).
/// A dimension with no values keeps its discovery defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseQuery {
    pub status_filter: Vec<String>,
    pub member_filter: Vec<String>,
    pub space_filter: Vec<String>,
    pub date: Option<NaiveDate>,
}

impl PulseQuery {
    /// Build from raw `(key, value)` pairs. Unknown keys are ignored and a
    /// trailing `[]` on a key is accepted.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, RequestError> {
        let mut query = PulseQuery::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim_end_matches("[]") {
                "status_filter" => query.status_filter.push(value.to_string()),
                "member_filter" => query.member_filter.push(value.to_string()),
                "space_filter" => query.space_filter.push(value.to_string()),
                "date" => {
                    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                        RequestError::InvalidDate {
                            value: value.to_string(),
                        }
                    })?;
                    query.date = Some(date);
                }
                _ => {}
            }
        }
        Ok(query)
    }

    /// Narrow `base` to the requested keys, dimension by dimension.
    pub fn apply(&self, base: FilterSet) -> FilterSet {
        let mut filters = base;
        for (dimension, keys) in [
            (FilterDimension::Status, &self.status_filter),
            (FilterDimension::Member, &self.member_filter),
            (FilterDimension::Space, &self.space_filter),
        ] {
            if !keys.is_empty() {
                filters = filters.only(dimension, keys.iter().cloned());
            }
        }
        filters
    }

    /// Start of the requested day (UTC), or `now` when no date was given.
    pub fn reference_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or(now)
    }
}

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sample query parameters exactly as they arrived on the query string.
///
/// Every field is kept as text so that `normalize_sample_query` can report
/// which parameter was wrong instead of a generic extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSampleQuery {
    pub skip: Option<String>,
    pub limit: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
    pub sort: Option<String>,
}

/// Order in which the upstream returns samples, by timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse the wire value. Only the exact lowercase names are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fractional unix timestamp that keeps the caller's exact text.
///
/// The text is forwarded upstream untouched; the parsed `f64` only serves
/// range checks.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSeconds {
    text: String,
    seconds: f64,
}

impl EpochSeconds {
    /// Accepts anything Rust parses as a finite `f64` (`1700000000`,
    /// `1.7e9`, `.5`). Surrounding whitespace is dropped.
    pub fn parse(value: &str) -> Option<Self> {
        let text = value.trim();
        f64::from_str(text)
            .ok()
            .filter(|seconds| seconds.is_finite())
            .map(|seconds| Self {
                text: text.to_string(),
                seconds,
            })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Compare two timestamps.
    ///
    /// Uses exact decimal comparison when both values fit a `Decimal`, so
    /// bounds that differ past `f64` precision still order correctly.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.exact(), other.exact()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.seconds.total_cmp(&other.seconds),
        }
    }

    fn exact(&self) -> Option<Decimal> {
        Decimal::from_str_exact(&self.text)
            .or_else(|_| Decimal::from_scientific(&self.text))
            .ok()
    }
}

impl fmt::Display for EpochSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Validated pagination and filter parameters for a sensor sample query.
///
/// Built by [`crate::validation::normalize_sample_query`]; the `Default`
/// value is what an empty query string normalizes to.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleQuery {
    /// Samples to skip before the first returned one
    pub skip: u64,
    /// Maximum samples to return, in `1..=2000`
    pub limit: u32,
    /// Only samples before this fractional unix timestamp
    pub before: Option<EpochSeconds>,
    /// Only samples after this fractional unix timestamp
    pub after: Option<EpochSeconds>,
    pub sort: SortOrder,
}

impl Default for SampleQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: crate::validation::DEFAULT_SAMPLE_LIMIT,
            before: None,
            after: None,
            sort: SortOrder::Desc,
        }
    }
}

impl SampleQuery {
    /// Query-string pairs for the upstream call.
    ///
    /// `before` and `after` are left out entirely when absent.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ];

        if let Some(before) = &self.before {
            pairs.push(("before", before.as_str().to_string()));
        }
        if let Some(after) = &self.after {
            pairs.push(("after", after.as_str().to_string()));
        }

        pairs.push(("sort", self.sort.as_str().to_string()));
        pairs
    }
}

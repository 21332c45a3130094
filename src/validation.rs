//! Validation of inbound parameters before they are forwarded upstream.
//!
//! The sample query rules mirror the upstream API's published constraints so
//! that obviously bad requests are rejected with a field name instead of an
//! opaque upstream 422.

use std::cmp::Ordering;

use crate::error::{AppError, AppResult};
use crate::models::{EpochSeconds, RawSampleQuery, SampleQuery, SortOrder};

// =============================================================================
// Validation Constants
// =============================================================================

/// Number of samples returned when `limit` is not given.
pub const DEFAULT_SAMPLE_LIMIT: u32 = 60;

/// Largest `limit` the upstream accepts.
pub const MAX_SAMPLE_LIMIT: u32 = 2000;

/// Largest `skip` the upstream accepts (2^53 - 1, the JSON safe integer bound).
pub const MAX_SAMPLE_SKIP: u64 = 9_007_199_254_740_991;

/// Normalize raw sample query parameters.
///
/// Rules:
/// - `skip`: integer in `0..=2^53-1`, default 0
/// - `limit`: integer in `1..=2000`, default 60
/// - `before` / `after`: finite fractional epoch seconds, optional
/// - `sort`: `asc` or `desc`, default `desc`
/// - when both bounds are given, `after` must be earlier than `before`
///
/// Empty values (`?limit=`) are treated as absent.
pub fn normalize_sample_query(raw: &RawSampleQuery) -> AppResult<SampleQuery> {
    let skip = match present(&raw.skip) {
        Some(value) => parse_skip(value)?,
        None => 0,
    };

    let limit = match present(&raw.limit) {
        Some(value) => parse_limit(value)?,
        None => DEFAULT_SAMPLE_LIMIT,
    };

    let before = present(&raw.before)
        .map(|value| parse_epoch_seconds(value, "before"))
        .transpose()?;
    let after = present(&raw.after)
        .map(|value| parse_epoch_seconds(value, "after"))
        .transpose()?;

    if let (Some(before), Some(after)) = (&before, &after)
        && after.compare(before) != Ordering::Less
    {
        return Err(AppError::validation(
            "after",
            format!("must be earlier than before ({after} >= {before})"),
        ));
    }

    let sort = match present(&raw.sort) {
        Some(value) => SortOrder::parse(value).ok_or_else(|| {
            AppError::validation("sort", format!("must be 'asc' or 'desc', got '{value}'"))
        })?,
        None => SortOrder::default(),
    };

    Ok(SampleQuery {
        skip,
        limit,
        before,
        after,
        sort,
    })
}

/// Validate a sensor or actuator identifier taken from the path.
///
/// Identifiers are non-negative integers on the upstream side.
pub fn parse_resource_id(value: &str, field: &str) -> AppResult<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        AppError::validation(field, format!("must be a non-negative integer, got '{value}'"))
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_integer(value: &str, field: &str) -> AppResult<i128> {
    value
        .parse::<i128>()
        .map_err(|_| AppError::validation(field, format!("must be an integer, got '{value}'")))
}

fn parse_skip(value: &str) -> AppResult<u64> {
    let skip = parse_integer(value, "skip")?;

    if skip < 0 {
        return Err(AppError::validation(
            "skip",
            "must be greater than or equal to 0",
        ));
    }

    u64::try_from(skip)
        .ok()
        .filter(|skip| *skip <= MAX_SAMPLE_SKIP)
        .ok_or_else(|| AppError::validation("skip", format!("cannot exceed {MAX_SAMPLE_SKIP}")))
}

fn parse_limit(value: &str) -> AppResult<u32> {
    let limit = parse_integer(value, "limit")?;

    if limit <= 0 {
        return Err(AppError::validation("limit", "must be greater than 0"));
    }

    u32::try_from(limit)
        .ok()
        .filter(|limit| *limit <= MAX_SAMPLE_LIMIT)
        .ok_or_else(|| AppError::validation("limit", format!("cannot exceed {MAX_SAMPLE_LIMIT}")))
}

/// Parse fractional unix epoch seconds, keeping the caller's text.
///
/// Plain decimals (`1589500000.25`) and scientific notation (`1.5895e9`) are
/// accepted; `NaN`, infinities, digit separators and anything non-numeric
/// are rejected.
fn parse_epoch_seconds(value: &str, field: &str) -> AppResult<EpochSeconds> {
    EpochSeconds::parse(value).ok_or_else(|| {
        AppError::validation(
            field,
            format!("must be a unix timestamp in seconds, got '{value}'"),
        )
    })
}

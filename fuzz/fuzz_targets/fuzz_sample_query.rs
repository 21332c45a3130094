//! Fuzz testing for sample query normalization and path IDs.
//!
//! Checks that normalization never panics and that every accepted query
//! satisfies the bounds the upstream relies on.
//!
//! ```bash
//! cargo +nightly fuzz run fuzz_sample_query -- -max_total_time=60
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use kv_gateway::models::RawSampleQuery;
use kv_gateway::validation::{
    MAX_SAMPLE_LIMIT, MAX_SAMPLE_SKIP, normalize_sample_query, parse_resource_id,
};

#[derive(Debug, Arbitrary)]
struct Input {
    skip: Option<String>,
    limit: Option<String>,
    before: Option<String>,
    after: Option<String>,
    sort: Option<String>,
    id: String,
}

fuzz_target!(|input: Input| {
    let _ = parse_resource_id(&input.id, "sensor_id");

    let raw = RawSampleQuery {
        skip: input.skip,
        limit: input.limit,
        before: input.before,
        after: input.after,
        sort: input.sort,
    };

    if let Ok(query) = normalize_sample_query(&raw) {
        assert!(query.skip <= MAX_SAMPLE_SKIP);
        assert!((1..=MAX_SAMPLE_LIMIT).contains(&query.limit));
        if let (Some(before), Some(after)) = (&query.before, &query.after) {
            assert!(after.seconds() <= before.seconds());
            assert!(before.seconds().is_finite() && after.seconds().is_finite());
        }
        // Forwarded pairs always carry the three mandatory params
        let pairs = query.to_query_pairs();
        assert!(pairs.iter().any(|(k, _)| *k == "limit"));
    }
});

//! Property-based tests for freshness, storability and persistence.

use http::StatusCode;
use proptest::prelude::*;

use crate::{CacheEntry, CachePolicy, DecodeError, Headers};

// == Strategies ==
fn header_name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9-]{0,20}"
}

fn header_value_strategy() -> impl Strategy<Value = String> {
    "[ -~]{0,40}"
}

fn headers_strategy() -> impl Strategy<Value = Headers> {
    prop::collection::vec((header_name_strategy(), header_value_strategy()), 0..8)
        .prop_map(|pairs| pairs.into_iter().collect::<Headers>())
}

fn status_strategy() -> impl Strategy<Value = StatusCode> {
    (100u16..=999).prop_map(|code| StatusCode::from_u16(code).expect("code in range"))
}

fn entry_strategy() -> impl Strategy<Value = CacheEntry> {
    (
        status_strategy(),
        headers_strategy(),
        prop::collection::vec(any::<u8>(), 0..256),
        0u64..=u32::MAX as u64,
    )
        .prop_map(|(status, headers, body, now)| CacheEntry::new_at(status, headers, body, now))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_expiry_boundary(max_age in 1u64..1_000_000, stored_at in 0u64..=u32::MAX as u64) {
        let headers: Headers = [("Cache-Control", format!("max-age={max_age}"))]
            .into_iter()
            .collect();
        let entry = CacheEntry::new_at(StatusCode::OK, headers, Vec::new(), stored_at);

        prop_assert_eq!(entry.max_age(), max_age);
        prop_assert!(!entry.is_expired_at(stored_at + max_age - 1));
        prop_assert!(entry.is_expired_at(stored_at + max_age));
    }

    #[test]
    fn prop_no_store_is_never_cacheable(mut headers in headers_strategy(), shared in any::<bool>()) {
        headers.append("Cache-Control", "no-store");
        headers.append("ETag", "\"v1\"");
        let entry = CacheEntry::new_at(StatusCode::OK, headers, Vec::new(), 0);
        let policy = CachePolicy { shared, ..CachePolicy::default() };

        prop_assert!(!entry.can_cache_with(&policy));
    }

    #[test]
    fn prop_round_trip(entry in entry_strategy(), merge in headers_strategy(), now in any::<u64>()) {
        let entry = entry.revalidated(&merge, now);
        let record = entry.encode().expect("encodable");
        let decoded = CacheEntry::decode(&record);

        prop_assert_eq!(decoded, Ok(entry));
    }

    #[test]
    fn prop_truncated_records_fail(entry in entry_strategy(), cut in any::<prop::sample::Index>()) {
        let record = entry.encode().expect("encodable");
        let len = cut.index(record.len());
        let decoded = CacheEntry::decode(&record[..len]);

        prop_assert!(matches!(decoded, Err(DecodeError::Truncated { .. })), "expected Truncated, got {:?}", decoded);
    }

    #[test]
    fn prop_merge_never_touches_body_or_status(
        entry in entry_strategy(),
        merge in headers_strategy(),
        now in any::<u64>(),
    ) {
        let merged = entry.revalidated(&merge, now);

        prop_assert_eq!(merged.body(), entry.body());
        prop_assert_eq!(merged.status(), entry.status());
        prop_assert_eq!(merged.stored_at(), now);
        prop_assert_eq!(merged.revalidated(&merge, now), merged);
    }
}

//! Property-based tests for product id normalization and the value codec.
//!
//! No database or network access required.
//!
//! ```bash
//! cargo test --test property_tests
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```
//!
//! Each property is named `prop_<function>_<invariant>`.

use bulkvm::codec::{decode, encode};
use bulkvm::db::{normalize_product_ids, parse_product_ids};
use proptest::prelude::*;

/// Comma-separated lists mixing valid ids, junk and whitespace.
fn id_list() -> impl Strategy<Value = String> {
    let entry = prop_oneof![
        (1u32..100_000).prop_map(|n| n.to_string()),
        (1u32..1000).prop_map(|n| format!("  {} ", n)),
        Just("abc".to_string()),
        Just("0".to_string()),
        Just("-5".to_string()),
        Just("".to_string()),
    ];
    prop::collection::vec(entry, 0..12).prop_map(|v| v.join(","))
}

proptest! {
    #[test]
    fn prop_normalize_is_idempotent(input in id_list()) {
        if let Ok(once) = normalize_product_ids(&input) {
            prop_assert_eq!(normalize_product_ids(&once).unwrap(), once);
        }
    }

    #[test]
    fn prop_normalize_keeps_only_positive_ids(input in id_list()) {
        match normalize_product_ids(&input) {
            Ok(out) => {
                for part in out.split(',') {
                    let id: i64 = part.parse().unwrap();
                    prop_assert!(id > 0);
                    prop_assert_eq!(id.to_string(), part);
                }
                prop_assert_eq!(parse_product_ids(&out), parse_product_ids(&input));
            }
            Err(_) => prop_assert!(parse_product_ids(&input).is_empty()),
        }
    }

    #[test]
    fn prop_codec_round_trips_plain_text(value in "\\PC*") {
        prop_assume!(!value.trim_start().starts_with('[') && !value.trim_start().starts_with('{'));
        prop_assert_eq!(decode(&encode(&value)), value);
    }

    #[test]
    fn prop_encode_is_ascii(value in "\\PC*") {
        prop_assert!(encode(&value).is_ascii());
    }

    #[test]
    fn prop_codec_round_trips_compact_arrays(items in prop::collection::vec("[a-z0-9/]{0,6}", 0..5)) {
        let compact = serde_json::to_string(&items).unwrap().replace("\\/", "/");
        prop_assert_eq!(decode(&encode(&compact)), compact);
    }
}

//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use proptest::prelude::*;

/// Strategy for valid chunker bounds `(min, avg, max)` with
/// `0 < min <= avg <= max`.
pub fn chunk_bounds_strategy() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..256, 0usize..256, 0usize..512)
        .prop_map(|(min, extra_avg, extra_max)| (min, min + extra_avg, min + extra_avg + extra_max))
}

/// Strategy for payload bytes.
pub fn payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Strategy for safe, normalized relative paths (`a/b.txt`).
pub fn relative_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::string::string_regex("[a-z0-9_][a-z0-9_.-]{0,11}").expect("Invalid regex"),
        1..4,
    )
    .prop_map(|parts| parts.join("/"))
}

/// Strategy for paths that must be rejected as unsafe.
pub fn unsafe_path_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        relative_path_strategy().prop_map(|p| format!("../{p}")),
        relative_path_strategy().prop_map(|p| format!("{p}/../../x")),
        relative_path_strategy().prop_map(|p| format!("/{p}")),
        relative_path_strategy().prop_map(|p| format!("C:\\{p}")),
        Just(String::new()),
        Just("./".to_string()),
    ]
}

/// Strategy for lists of chunk ids (64 lowercase hex characters).
pub fn chunk_ids_strategy(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::string::string_regex("[0-9a-f]{64}").expect("Invalid regex"),
        0..=max_len,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn bounds_are_ordered((min, avg, max) in chunk_bounds_strategy()) {
            prop_assert!(min > 0 && min <= avg && avg <= max);
        }

        #[test]
        fn relative_paths_are_clean(path in relative_path_strategy()) {
            prop_assert!(!path.starts_with('/'));
            prop_assert!(path.split('/').all(|s| !s.is_empty() && s != ".."));
        }

        #[test]
        fn chunk_ids_are_hex(ids in chunk_ids_strategy(8)) {
            for id in ids {
                prop_assert_eq!(id.len(), 64);
            }
        }
    }
}

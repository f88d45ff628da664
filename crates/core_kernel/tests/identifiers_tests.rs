//! Unit tests for the opaque identifier types

use core_kernel::{AnalysisId, ClaimId, UserId};

mod claim_id_tests {
    use super::*;

    #[test]
    fn test_generate_produces_unique_ids() {
        let id1 = ClaimId::generate();
        let id2 = ClaimId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generated_ids_are_hex() {
        let id = ClaimId::generate();
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_display_is_raw_value() {
        let id = ClaimId::new("7Hq2kLm9");
        assert_eq!(id.to_string(), "7Hq2kLm9");
    }

    #[test]
    fn test_from_str_round_trips_display() {
        let original = ClaimId::generate();
        let parsed: ClaimId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_prefix_of_six() {
        let id = ClaimId::new("a1b2c3d4e5");
        assert_eq!(id.prefix(6), "a1b2c3");
    }

    #[test]
    fn test_empty_id() {
        let id = ClaimId::new("");
        assert!(id.is_empty());
        assert_eq!(id.prefix(6), "");
    }
}

mod analysis_id_tests {
    use super::*;

    #[test]
    fn test_contains_claim_prefix() {
        let claim = ClaimId::new("a1b2c3d4e5");
        let analysis = AnalysisId::new("FA-a1b2c3-0001");
        assert!(analysis.as_str().contains(claim.prefix(6)));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a = AnalysisId::new("FA-001");
        let b = AnalysisId::new("FA-002");
        assert!(a < b);
    }

    #[test]
    fn test_deserialize_from_plain_string() {
        let id: AnalysisId = serde_json::from_str("\"FA-xyz\"").unwrap();
        assert_eq!(id.as_str(), "FA-xyz");
    }
}

mod user_id_tests {
    use super::*;

    #[test]
    fn test_from_string() {
        let id: UserId = String::from("uid-42").into();
        assert_eq!(id.as_ref(), "uid-42");
    }
}

mod prefix_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prefix_is_a_prefix_of_at_most_n_chars(raw in "\\PC{0,20}", n in 0usize..10) {
            let id = ClaimId::new(raw.clone());
            let prefix = id.prefix(n);
            prop_assert!(raw.starts_with(prefix));
            prop_assert_eq!(prefix.chars().count(), raw.chars().count().min(n));
        }
    }
}

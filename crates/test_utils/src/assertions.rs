//! Custom Test Assertions
//!
//! Assertion helpers for review records that give more meaningful failure
//! messages than plain `assert!`.

use domain_claims::record::ReviewRecord;
use domain_claims::status::ReviewStatus;

/// Asserts that records are ordered newest first (ties by id, descending)
///
/// # Panics
///
/// Panics naming the first adjacent pair out of order
pub fn assert_newest_first<R: ReviewRecord>(records: &[R]) {
    for pair in records.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let ordered = a.created_at() > b.created_at()
            || (a.created_at() == b.created_at() && a.id_str() >= b.id_str());
        assert!(
            ordered,
            "Records out of order: {} ({}) before {} ({})",
            a.id_str(),
            a.created_at(),
            b.id_str(),
            b.created_at()
        );
    }
}

/// Asserts that a value is a percentage in [0,100]
pub fn assert_percent(value: f64) {
    assert!(
        (0.0..=100.0).contains(&value),
        "Expected a percentage in [0,100], got {}",
        value
    );
}

/// Asserts that two floats are equal within `tolerance`
pub fn assert_approx_eq(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "Values differ by more than tolerance: actual={}, expected={}, tolerance={}",
        actual,
        expected,
        tolerance
    );
}

/// Asserts the review status of a record
pub fn assert_status<R: ReviewRecord>(record: &R, expected: ReviewStatus) {
    assert_eq!(
        record.status(),
        expected,
        "Unexpected status for {}: {} (expected {})",
        record.id_str(),
        record.status(),
        expected
    );
}

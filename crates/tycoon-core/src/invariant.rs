//! Invariant violations: programming defects, not player-facing failures.
//!
//! Debug builds panic so the defect is caught in tests. Release builds log
//! at `error` level and let the caller clamp, so a bad tick cannot corrupt
//! a save.

/// Report a broken invariant. Panics in debug builds; logs in release.
#[track_caller]
pub fn violation(what: &str) {
    if cfg!(debug_assertions) {
        panic!("invariant violated: {what}");
    }
    tracing::error!(invariant = what, "invariant violated, clamping");
}

/// Subtract `amount` from `value`, clamping at zero. An underflow is an
/// invariant violation: callers must have checked availability first.
#[track_caller]
pub fn checked_debit(value: &mut u64, amount: u64, what: &str) {
    match value.checked_sub(amount) {
        Some(rest) => *value = rest,
        None => {
            violation(what);
            *value = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_within_balance() {
        let mut v = 10;
        checked_debit(&mut v, 4, "test pool");
        assert_eq!(v, 6);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "invariant violated: test pool")]
    fn overdraw_panics_in_debug() {
        let mut v = 1;
        checked_debit(&mut v, 2, "test pool");
    }
}

//! Wall-clock budget shared by the checkers. A timeout of `0` means none.

use std::time::{Duration, Instant};

pub(crate) fn deadline_from_timeout_secs(timeout_secs: u64) -> Option<Instant> {
    if timeout_secs == 0 {
        return None;
    }
    Instant::now().checked_add(Duration::from_secs(timeout_secs))
}

pub(crate) fn deadline_exceeded(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|at| Instant::now() >= at)
}

/// Budget left for a per-query solver limit, in whole seconds rounded up.
/// `Some(0)` once the deadline has passed.
pub(crate) fn remaining_timeout_secs(deadline: Option<Instant>) -> Option<u64> {
    let left = deadline?.saturating_duration_since(Instant::now());
    let partial = u64::from(left.subsec_nanos() > 0);
    Some(left.as_secs().saturating_add(partial))
}

pub(crate) fn timeout_unknown_reason(context: &str) -> String {
    format!("{context} timed out before completion")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_timeout_never_expires() {
        let deadline = deadline_from_timeout_secs(0);
        assert!(deadline.is_none());
        assert!(!deadline_exceeded(deadline));
        assert_eq!(remaining_timeout_secs(deadline), None);
    }

    #[test]
    fn fresh_deadline_rounds_remaining_time_up() {
        let deadline = deadline_from_timeout_secs(60);
        assert!(!deadline_exceeded(deadline));
        let left = remaining_timeout_secs(deadline).unwrap();
        assert!((1..=60).contains(&left), "{left}");
    }

    #[test]
    fn expired_deadline_leaves_nothing() {
        let past = Instant::now() - Duration::from_millis(5);
        assert!(deadline_exceeded(Some(past)));
        assert_eq!(remaining_timeout_secs(Some(past)), Some(0));
    }

    #[test]
    fn reason_names_the_context() {
        assert_eq!(
            timeout_unknown_reason("z3 on split-bounds"),
            "z3 on split-bounds timed out before completion"
        );
    }
}
